//! Comprehensive tests for the file storage abstraction layer

#[cfg(test)]
mod integration_tests {
    use crate::error::StorageError;
    use crate::storage::config::{StorageBackend, StorageConfig};
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_storage_abstraction_end_to_end() {
        let temp = tempfile::TempDir::new().unwrap();
        let backends = vec![StorageBackend::Mock, StorageBackend::Local];
        let uploaded_at = Utc.with_ymd_and_hms(2023, 11, 20, 9, 0, 0).unwrap();

        for backend in backends {
            let config = StorageConfig {
                backend: backend.clone(),
                media_root: temp.path().join(format!("{:?}", backend)).display().to_string(),
                upload_dir: "quotes".to_string(),
            };
            let store = config.create_store().expect("store creation failed");
            let data = format!("End-to-end image for {:?}", backend).into_bytes();

            let file = store.save("garage.png", &data, uploaded_at).expect("Save failed");
            assert_eq!(file.as_str(), "quotes/2023/11/garage.png", "{:?}", backend);
            assert_eq!(store.open(&file).expect("Open failed"), data);

            store.delete(&file).expect("Delete failed");
            assert!(!store.exists(&file).unwrap(), "{:?}: file should be gone", backend);
            store.delete(&file).expect("Second delete should be a no-op");
            assert!(matches!(store.open(&file), Err(StorageError::NotFound(_))));
        }
    }

    #[test]
    fn test_only_local_backend_resolves_paths() {
        let temp = tempfile::TempDir::new().unwrap();
        let media_root = temp.path().join("media");

        let local = StorageConfig {
            backend: StorageBackend::Local,
            media_root: media_root.display().to_string(),
            upload_dir: "quotes".to_string(),
        }
        .create_store()
        .unwrap();
        let mock = StorageConfig { backend: StorageBackend::Mock, ..StorageConfig::default() }
            .create_store()
            .unwrap();

        let file = local.save("a.jpg", b"a", Utc::now()).unwrap();
        assert!(local.path(&file).unwrap().starts_with(&media_root));

        let file = mock.save("a.jpg", b"a", Utc::now()).unwrap();
        assert!(matches!(mock.path(&file), Err(StorageError::Unsupported)));
    }
}
