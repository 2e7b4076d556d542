#[cfg(test)]
mod tests {
    use kodegen_bundler_nsis::bundler::{
        Arch, CodesignOptions, Error, MakerNsisConfig, NsisMaker, PackageTarget, Packager, Result,
        Settings, SettingsBuilder, Signer, UpdaterConfig, artifact, updater,
    };
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    #[derive(Default)]
    struct FakeSigner {
        fail: bool,
        signed_dirs: Arc<Mutex<Vec<PathBuf>>>,
    }

    impl Signer for FakeSigner {
        async fn sign_directory(&self, dir: &Path, _options: &CodesignOptions) -> Result<Vec<PathBuf>> {
            if self.fail {
                return Err(Error::Sign("certificate rejected".into()));
            }
            self.signed_dirs.lock().unwrap().push(dir.to_path_buf());
            Ok(vec![dir.join("MyApp.exe")])
        }

        async fn sign_file(&self, _file: &Path, _options: &CodesignOptions) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Debug, Clone)]
    struct BuildCall {
        spec: String,
        saw_update_descriptor: bool,
        saw_app_binary: bool,
        signing_password: Option<String>,
    }

    /// Writes a fixed set of files into the scratch directory.
    #[derive(Default)]
    struct FakePackager {
        files: Vec<(&'static str, Vec<u8>)>,
        calls: Arc<Mutex<Vec<BuildCall>>>,
    }

    impl FakePackager {
        fn producing(files: Vec<(&'static str, Vec<u8>)>) -> Self {
            Self {
                files,
                ..Default::default()
            }
        }
    }

    impl Packager for FakePackager {
        async fn build(&self, source_dir: &Path, target: &PackageTarget<'_>) -> Result<Vec<PathBuf>> {
            self.calls.lock().unwrap().push(BuildCall {
                spec: target.spec(),
                saw_update_descriptor: source_dir.join("app-update.yml").is_file(),
                saw_app_binary: source_dir.join("MyApp.exe").is_file(),
                signing_password: target
                    .signing
                    .and_then(|options| options.certificate_password.clone()),
            });

            std::fs::create_dir_all(target.output_dir)?;
            let mut produced = Vec::new();
            for (name, contents) in &self.files {
                let path = target.output_dir.join(name);
                std::fs::write(&path, contents)?;
                produced.push(path);
            }
            Ok(produced)
        }
    }

    struct Fixture {
        tmp: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            let tmp = TempDir::new().unwrap();
            let app = tmp.path().join("MyApp-win32-x64");
            std::fs::create_dir_all(app.join("resources")).unwrap();
            std::fs::write(app.join("MyApp.exe"), b"MZ app").unwrap();
            std::fs::write(app.join("resources/app.asar"), b"asar").unwrap();
            Self { tmp }
        }

        fn make_dir(&self) -> PathBuf {
            self.tmp.path().join("make")
        }

        fn out_dir(&self) -> PathBuf {
            self.make_dir().join("nsis").join("x64")
        }

        fn staging_dir(&self) -> PathBuf {
            self.make_dir().join("nsis").join("x64-tmp")
        }

        fn scratch_dir(&self) -> PathBuf {
            self.make_dir().join("nsis").join("make")
        }

        fn settings(&self, config: MakerNsisConfig, app_version: Option<&str>) -> SettingsBuilder {
            let builder = SettingsBuilder::new()
                .app_dir(self.tmp.path().join("MyApp-win32-x64"))
                .make_dir(self.make_dir())
                .app_name("MyApp")
                .arch(Arch::X64)
                .config(config);
            match app_version {
                Some(version) => builder.app_version(version),
                None => builder,
            }
        }

        fn build(&self, config: MakerNsisConfig, app_version: Option<&str>) -> Settings {
            self.settings(config, app_version).build().unwrap()
        }
    }

    fn updater_config() -> MakerNsisConfig {
        MakerNsisConfig {
            updater: Some(UpdaterConfig::new("https://downloads.example.com/myapp")),
            ..Default::default()
        }
    }

    fn codesign_options() -> CodesignOptions {
        CodesignOptions {
            certificate_file: "cert.pfx".into(),
            certificate_password: Some("secret".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_make_without_updater_writes_no_manifests() {
        let fixture = Fixture::new();
        let packager = FakePackager::producing(vec![("MyApp Setup 1.0.0.exe", b"installer".to_vec())]);
        let calls = packager.calls.clone();
        let maker = NsisMaker::with_collaborators(
            fixture.build(MakerNsisConfig::default(), None),
            FakeSigner::default(),
            packager,
        );

        let outputs = maker.make().await.unwrap();

        assert_eq!(outputs, vec![fixture.out_dir().join("MyApp Setup 1.0.0.exe")]);
        assert!(!fixture.out_dir().join("latest.yml").exists());

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].spec, "nsis:x64");
        assert!(calls[0].saw_app_binary);
        assert!(!calls[0].saw_update_descriptor);
        assert_eq!(calls[0].signing_password, None);
    }

    #[tokio::test]
    async fn test_make_with_updater_writes_channel_manifest() {
        let fixture = Fixture::new();
        let installer_bytes = vec![0xab_u8; 70_000];
        let packager = FakePackager::producing(vec![
            ("MyApp Setup 1.2.3.exe", installer_bytes.clone()),
            ("MyApp Setup 1.2.3.exe.blockmap", b"blockmap".to_vec()),
        ]);
        let calls = packager.calls.clone();
        let maker = NsisMaker::with_collaborators(
            fixture.build(updater_config(), Some("9.9.9")),
            FakeSigner::default(),
            packager,
        );

        let outputs = maker.make().await.unwrap();
        let out_dir = fixture.out_dir();
        let installer = out_dir.join("MyApp Setup 1.2.3.exe");

        assert_eq!(
            outputs,
            vec![
                installer.clone(),
                out_dir.join("MyApp Setup 1.2.3.exe.blockmap"),
                out_dir.join("latest.yml"),
            ]
        );
        assert_eq!(std::fs::read(&installer).unwrap(), installer_bytes);
        assert!(calls.lock().unwrap()[0].saw_update_descriptor);

        let manifest = updater::read_channel_manifest(&out_dir.join("latest.yml"))
            .await
            .unwrap();
        assert_eq!(manifest.version, "1.2.3");
        assert_eq!(manifest.path, "MyApp Setup 1.2.3.exe");
        assert_eq!(manifest.sha512, artifact::compute_hash(&installer).await.unwrap());
        assert_eq!(manifest.files[0].sha512, manifest.sha512);
        assert_eq!(manifest.files[0].url, manifest.path);
        assert_eq!(manifest.files[0].size, 70_000);

        let verification = updater::verify_channel_manifest(&out_dir.join("latest.yml"))
            .await
            .unwrap();
        assert!(verification.is_valid());
    }

    #[tokio::test]
    async fn test_make_uses_configured_channel_name() {
        let fixture = Fixture::new();
        let mut config = updater_config();
        if let Some(updater) = config.updater.as_mut() {
            updater.channel = Some("beta".into());
        }
        let maker = NsisMaker::with_collaborators(
            fixture.build(config, None),
            FakeSigner::default(),
            FakePackager::producing(vec![("MyApp Setup 2.0.0-beta.1.exe", b"x".to_vec())]),
        );

        let outputs = maker.make().await.unwrap();
        assert_eq!(outputs.last(), Some(&fixture.out_dir().join("beta.yml")));
        assert!(!fixture.out_dir().join("latest.yml").exists());
    }

    #[tokio::test]
    async fn test_make_cleans_temporary_directories() {
        let fixture = Fixture::new();
        let maker = NsisMaker::with_collaborators(
            fixture.build(updater_config(), None),
            FakeSigner::default(),
            FakePackager::producing(vec![("MyApp Setup 1.0.0.exe", b"x".to_vec())]),
        );

        maker.make().await.unwrap();

        assert!(!fixture.staging_dir().exists());
        assert!(!fixture.scratch_dir().exists());
        assert!(fixture.out_dir().is_dir());
    }

    #[tokio::test]
    async fn test_make_keep_temp_preserves_staging() {
        let fixture = Fixture::new();
        let settings = fixture
            .settings(updater_config(), None)
            .keep_temp(true)
            .build()
            .unwrap();
        let maker = NsisMaker::with_collaborators(
            settings,
            FakeSigner::default(),
            FakePackager::producing(vec![("MyApp Setup 1.0.0.exe", b"x".to_vec())]),
        );

        maker.make().await.unwrap();

        assert!(fixture.staging_dir().join("MyApp.exe").is_file());
        assert!(fixture.staging_dir().join("resources/app.asar").is_file());
        assert!(fixture.staging_dir().join("app-update.yml").is_file());
    }

    #[tokio::test]
    async fn test_make_clears_previous_output() {
        let fixture = Fixture::new();
        std::fs::create_dir_all(fixture.out_dir()).unwrap();
        std::fs::write(fixture.out_dir().join("MyApp Setup 0.1.0.exe"), b"old").unwrap();

        let maker = NsisMaker::with_collaborators(
            fixture.build(MakerNsisConfig::default(), None),
            FakeSigner::default(),
            FakePackager::producing(vec![("MyApp Setup 0.2.0.exe", b"new".to_vec())]),
        );
        maker.make().await.unwrap();

        assert!(!fixture.out_dir().join("MyApp Setup 0.1.0.exe").exists());
        assert!(fixture.out_dir().join("MyApp Setup 0.2.0.exe").is_file());
    }

    #[tokio::test]
    async fn test_signing_failure_aborts_before_packaging() {
        let fixture = Fixture::new();
        let config = MakerNsisConfig {
            codesign: Some(codesign_options()),
            ..updater_config()
        };
        let packager = FakePackager::producing(vec![("MyApp Setup 1.0.0.exe", b"x".to_vec())]);
        let calls = packager.calls.clone();
        let signer = FakeSigner {
            fail: true,
            ..Default::default()
        };
        let maker = NsisMaker::with_collaborators(fixture.build(config, None), signer, packager);

        let err = maker.make().await.unwrap_err();

        assert!(matches!(err, Error::Sign(_)));
        assert!(calls.lock().unwrap().is_empty());
        assert!(!fixture.staging_dir().join("app-update.yml").exists());
        // Failed builds leave staging in place for inspection.
        assert!(fixture.staging_dir().join("MyApp.exe").is_file());
    }

    #[tokio::test]
    async fn test_signing_options_reach_packager() {
        let fixture = Fixture::new();
        let config = MakerNsisConfig {
            codesign: Some(codesign_options()),
            ..Default::default()
        };
        let packager = FakePackager::producing(vec![("MyApp Setup 1.0.0.exe", b"x".to_vec())]);
        let calls = packager.calls.clone();
        let signer = FakeSigner::default();
        let signed_dirs = signer.signed_dirs.clone();
        let maker = NsisMaker::with_collaborators(fixture.build(config, None), signer, packager);

        maker.make().await.unwrap();

        assert_eq!(*signed_dirs.lock().unwrap(), vec![fixture.staging_dir()]);
        assert_eq!(
            calls.lock().unwrap()[0].signing_password.as_deref(),
            Some("secret")
        );
    }

    #[tokio::test]
    async fn test_missing_installer_with_updater_fails() {
        let fixture = Fixture::new();
        let maker = NsisMaker::with_collaborators(
            fixture.build(updater_config(), Some("1.0.0")),
            FakeSigner::default(),
            FakePackager::producing(vec![("build.log", b"done".to_vec())]),
        );

        let err = maker.make().await.unwrap_err();
        assert!(matches!(err, Error::MissingInstaller { .. }));
    }

    #[tokio::test]
    async fn test_missing_installer_without_updater_is_not_fatal() {
        let fixture = Fixture::new();
        let maker = NsisMaker::with_collaborators(
            fixture.build(MakerNsisConfig::default(), None),
            FakeSigner::default(),
            FakePackager::producing(vec![("build.log", b"done".to_vec())]),
        );

        let outputs = maker.make().await.unwrap();
        assert_eq!(outputs, vec![fixture.out_dir().join("build.log")]);
    }

    #[tokio::test]
    async fn test_version_falls_back_to_app_version() {
        let fixture = Fixture::new();
        let maker = NsisMaker::with_collaborators(
            fixture.build(updater_config(), Some("3.1.0")),
            FakeSigner::default(),
            FakePackager::producing(vec![("installer.exe", b"x".to_vec())]),
        );

        maker.make().await.unwrap();

        let manifest = updater::read_channel_manifest(&fixture.out_dir().join("latest.yml"))
            .await
            .unwrap();
        assert_eq!(manifest.version, "3.1.0");
        assert_eq!(manifest.path, "installer.exe");
    }

    #[tokio::test]
    async fn test_missing_version_is_an_error() {
        let fixture = Fixture::new();
        let maker = NsisMaker::with_collaborators(
            fixture.build(updater_config(), None),
            FakeSigner::default(),
            FakePackager::producing(vec![("installer.exe", b"x".to_vec())]),
        );

        let err = maker.make().await.unwrap_err();
        assert!(matches!(err, Error::MissingVersion { .. }));
    }

    #[tokio::test]
    async fn test_missing_app_dir_fails() {
        let fixture = Fixture::new();
        let settings = SettingsBuilder::new()
            .app_dir(fixture.tmp.path().join("does-not-exist"))
            .make_dir(fixture.make_dir())
            .app_name("MyApp")
            .arch(Arch::X64)
            .build()
            .unwrap();
        let packager = FakePackager::default();
        let calls = packager.calls.clone();
        let maker = NsisMaker::with_collaborators(settings, FakeSigner::default(), packager);

        assert!(maker.make().await.is_err());
        assert!(calls.lock().unwrap().is_empty());
    }
}
