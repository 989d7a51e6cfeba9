//! The shipped gantry.yaml must always validate

use gantry::core::{PipelineConfig, Platform, TriggerEvent};

#[test]
fn shipped_config_is_valid() {
    let config = PipelineConfig::from_file("gantry.yaml").unwrap();
    assert_eq!(config.name, "contract-ci");

    // 3 platforms x 1 toolchain x 4 jobs
    assert_eq!(config.matrix.expand().len(), 12);

    // Every platform resolves to a node source
    let node = config.node.as_ref().unwrap();
    for platform in [Platform::Linux, Platform::Macos, Platform::Windows] {
        assert!(node.artifacts.contains_key(&platform));
    }
}

#[test]
fn shipped_triggers_cover_pushes_tags_and_prs() {
    let config = PipelineConfig::from_file("gantry.yaml").unwrap();

    assert!(config.triggers.matches(&TriggerEvent::Push {
        branch: "main".to_string()
    }));
    assert!(config.triggers.matches(&TriggerEvent::Tag {
        tag: "v0.23.0".to_string()
    }));
    assert!(config.triggers.matches(&TriggerEvent::PullRequest {
        target: "main".to_string()
    }));

    assert!(!config.triggers.matches(&TriggerEvent::Push {
        branch: "feature/x".to_string()
    }));
    assert!(!config.triggers.matches(&TriggerEvent::Tag {
        tag: "latest".to_string()
    }));
}

#[test]
fn shipped_hooks_mirror_the_gate() {
    let config = PipelineConfig::from_file("gantry.yaml").unwrap();
    let ids: Vec<&str> = config.hooks.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            "trailing-whitespace",
            "end-of-file-fixer",
            "fmt",
            "fmt-check",
            "lint",
            "contract-check",
        ]
    );
    assert!(config.hooks.iter().all(|h| !h.types.is_empty()));
}
