//! Startup: configuration loading and fail-fast credential checks.

use std::fs;

use policy_rag::infrastructure::config::CONFIG_DIR;
use policy_rag::{ConfigLoader, DomainError, RagContext};

#[tokio::test]
async fn test_missing_api_key_fails_before_touching_disk() {
    let project = tempfile::tempdir().unwrap();
    let config = temp_env::with_vars(
        [("GEMINI_API_KEY", None::<&str>), ("POLICY_RAG_PROVIDER__API_KEY", None)],
        || ConfigLoader::load_from_dir(project.path(), None),
    )
    .unwrap();
    assert!(config.provider.api_key.is_none());

    let mut config = config;
    config.database.data_dir = project.path().join("data");

    let err = RagContext::initialize(config).await.err().unwrap();
    assert!(matches!(
        err.downcast_ref::<DomainError>(),
        Some(DomainError::MissingApiKey { .. })
    ));
    assert!(err.to_string().contains("GEMINI_API_KEY"));
    assert!(!project.path().join("data").exists());
}

#[tokio::test]
async fn test_environment_key_is_used() {
    let project = tempfile::tempdir().unwrap();
    let config = temp_env::with_vars(
        [("GEMINI_API_KEY", Some("env-key")), ("POLICY_RAG_PROVIDER__API_KEY", None)],
        || ConfigLoader::load_from_dir(project.path(), None),
    )
    .unwrap();
    assert_eq!(config.provider.api_key(), Some("env-key"));

    let mut config = config;
    config.database.data_dir = project.path().join("data");
    let context = RagContext::initialize(config).await.unwrap();
    assert_eq!(context.generator().model(), "gemini-2.5-flash");
    assert!(project.path().join("data/vectors.db").exists());
}

#[test]
fn test_project_config_file_is_merged() {
    let project = tempfile::tempdir().unwrap();
    fs::create_dir_all(project.path().join(CONFIG_DIR)).unwrap();
    fs::write(
        project.path().join(CONFIG_DIR).join("config.yaml"),
        "rag:\n  collection_name: staging_policies\n  top_k: 6\n",
    )
    .unwrap();

    let config = temp_env::with_vars([("POLICY_RAG_RAG__TOP_K", None::<&str>)], || {
        ConfigLoader::load_from_dir(project.path(), None)
    })
    .unwrap();
    assert_eq!(config.rag.collection_name, "staging_policies");
    assert_eq!(config.rag.top_k, 6);
    assert_eq!(config.rag.chunk_size, 512);
}

#[test]
fn test_invalid_chunking_is_rejected_at_load() {
    let project = tempfile::tempdir().unwrap();
    let explicit = project.path().join("bad.yaml");
    fs::write(&explicit, "rag:\n  chunk_size: 50\n  chunk_overlap: 50\n").unwrap();

    let err = ConfigLoader::load_from_dir(project.path(), Some(&explicit)).unwrap_err();
    assert!(err.to_string().to_lowercase().contains("chunk"), "got {err:#}");
}
