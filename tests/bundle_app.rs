//! End-to-end bundle assembly with fake binary tools.

mod common;

use common::{Call, FakeBinary, FakeTools, app, dylib, executable, framework, settings};
use kodegen_bundler_app::bundler::dylib::LibraryKind;
use kodegen_bundler_app::bundler::{
    AppSettings, Bundler, Error, FailurePolicy, IOS_RPATH, MACOS_RPATH, Platform, SettingsBuilder,
    SigningOutcome, SigningPolicy,
};
use std::path::{Path, PathBuf};

/// Package with `build/demo -> Foo.framework -> libbar.dylib`.
fn package(root: &Path) -> PathBuf {
    let build = root.join("build");
    dylib(&build, "libbar.dylib", &["/usr/lib/libSystem.B.dylib"]);
    framework(&build, "Foo", &["@rpath/libbar.dylib"]);
    executable(&build.join("demo"), &["@rpath/Foo.framework/Versions/A/Foo"])
}

fn plist_string(plist: &plist::Value, key: &str) -> Option<String> {
    plist
        .as_dictionary()
        .and_then(|dict| dict.get(key))
        .and_then(|value| value.as_string())
        .map(String::from)
}

#[tokio::test]
async fn macos_bundle_is_assembled_and_self_contained() {
    let temp = tempfile::tempdir().unwrap();
    let exe = package(temp.path());
    let bundler = Bundler::with_tools(
        settings(temp.path(), vec![app("Demo", &exe)]),
        FakeTools::new(),
    );

    let report = bundler.bundle().await.unwrap();

    assert!(report.is_success());
    let bundled = &report.bundled[0];
    let root = temp.path().join("dist/Demo.app");
    assert_eq!(bundled.bundle.path, root);
    assert_eq!(bundled.checksum.len(), 64);
    assert_eq!(bundled.bundle.count(LibraryKind::Framework), 1);
    assert_eq!(bundled.bundle.count(LibraryKind::Dylib), 1);
    assert!(bundled.bundle.violations.is_empty());
    assert_eq!(bundled.bundle.signing, SigningOutcome::Disabled);

    let main = FakeBinary::read(&root.join("Contents/MacOS/Demo")).unwrap();
    assert_eq!(main.rpaths, vec![MACOS_RPATH]);
    assert!(root.join("Contents/Frameworks/libbar.dylib").is_file());
    assert!(root.join("Contents/Frameworks/Foo.framework/Versions/A/Foo").is_file());
    assert!(root.join("Contents/Resources").is_dir());

    // Sources are never modified.
    let original = FakeBinary::read(&temp.path().join("build/libbar.dylib")).unwrap();
    assert_eq!(
        original.id,
        Some(temp.path().join("build/libbar.dylib").to_string_lossy().into_owned())
    );
    assert!(FakeBinary::read(&exe).unwrap().rpaths.is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn framework_symlinks_and_permissions_survive_the_copy() {
    use std::os::unix::fs::PermissionsExt;

    let temp = tempfile::tempdir().unwrap();
    let exe = package(temp.path());
    let bundler = Bundler::with_tools(
        settings(temp.path(), vec![app("Demo", &exe)]),
        FakeTools::new(),
    );

    bundler.bundle().await.unwrap();

    let foo = temp.path().join("dist/Demo.app/Contents/Frameworks/Foo.framework");
    assert!(std::fs::symlink_metadata(foo.join("Versions/Current")).unwrap().file_type().is_symlink());
    assert_eq!(std::fs::read_link(foo.join("Foo")).unwrap(), Path::new("Versions/Current/Foo"));
    let mode = std::fs::metadata(temp.path().join("dist/Demo.app/Contents/MacOS/Demo"))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o755);
}

#[tokio::test]
async fn repeated_runs_produce_identical_bundles() {
    let temp = tempfile::tempdir().unwrap();
    let exe = package(temp.path());
    let bundler = Bundler::with_tools(
        settings(temp.path(), vec![app("Demo", &exe)]),
        FakeTools::new(),
    );

    let first = bundler.bundle().await.unwrap();
    #[cfg(unix)]
    let first_modes = modes(&first.bundled[0].bundle.path);
    let second = bundler.bundle().await.unwrap();

    assert_eq!(first.bundled[0].checksum, second.bundled[0].checksum);
    assert_eq!(
        first.bundled[0].bundle.dependencies.len(),
        second.bundled[0].bundle.dependencies.len()
    );
    #[cfg(unix)]
    assert_eq!(first_modes, modes(&second.bundled[0].bundle.path));
}

/// Permission bits of every entry below `root`, by relative path.
#[cfg(unix)]
fn modes(root: &Path) -> Vec<(PathBuf, u32)> {
    use std::os::unix::fs::PermissionsExt;

    walkdir::WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .map(|entry| {
            let entry = entry.unwrap();
            let mode = std::fs::symlink_metadata(entry.path()).unwrap().permissions().mode();
            (entry.path().strip_prefix(root).unwrap().to_path_buf(), mode & 0o777)
        })
        .collect()
}

#[tokio::test]
async fn previous_bundle_is_replaced() {
    let temp = tempfile::tempdir().unwrap();
    let exe = package(temp.path());
    let stale = temp.path().join("dist/Demo.app/Contents/Frameworks/libstale.dylib");
    std::fs::create_dir_all(stale.parent().unwrap()).unwrap();
    std::fs::write(&stale, b"old").unwrap();
    let bundler = Bundler::with_tools(
        settings(temp.path(), vec![app("Demo", &exe)]),
        FakeTools::new(),
    );

    bundler.bundle().await.unwrap();

    assert!(!stale.exists());
}

#[tokio::test]
async fn distinct_libraries_sharing_a_name_are_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let vendor = temp.path().join("vendor");
    dylib(&vendor.join("a"), "libonlya.dylib", &[]);
    let first = dylib(&vendor.join("a"), "libfoo.dylib", &["@loader_path/libonlya.dylib"]);
    let second = dylib(&vendor.join("b"), "libfoo.dylib", &[]);
    let first_ref = first.to_string_lossy().into_owned();
    let second_ref = second.to_string_lossy().into_owned();
    let exe = executable(
        &temp.path().join("build/demo"),
        &[first_ref.as_str(), second_ref.as_str()],
    );
    let bundler = Bundler::with_tools(
        settings(temp.path(), vec![app("Demo", &exe)]),
        FakeTools::new(),
    );

    let err = bundler.bundle().await.unwrap_err();

    let message = err.to_string();
    assert!(message.contains("libfoo.dylib"), "{message}");
    assert!(message.contains(&first_ref), "{message}");
    assert!(message.contains(&second_ref), "{message}");
    let frameworks = temp.path().join("dist/Demo.app/Contents/Frameworks");
    assert!(!frameworks.join("libfoo.dylib").exists());
    assert!(bundler.tools().calls().is_empty());
}

#[tokio::test]
async fn executable_without_dependencies_gets_an_empty_frameworks_dir() {
    let temp = tempfile::tempdir().unwrap();
    let exe = executable(&temp.path().join("build/demo"), &["/usr/lib/libSystem.B.dylib"]);
    let bundler = Bundler::with_tools(
        settings(temp.path(), vec![app("Demo", &exe)]),
        FakeTools::new(),
    );

    let report = bundler.bundle().await.unwrap();

    let frameworks = temp.path().join("dist/Demo.app/Contents/Frameworks");
    assert!(frameworks.is_dir());
    assert_eq!(std::fs::read_dir(&frameworks).unwrap().count(), 0);
    assert!(report.bundled[0].bundle.dependencies.is_empty());
    assert!(!report.bundled[0].bundle.rewrite.rpath_added);
    assert!(bundler.tools().calls().is_empty());
}

#[tokio::test]
async fn ios_bundle_uses_the_flat_layout() {
    let temp = tempfile::tempdir().unwrap();
    let exe = package(temp.path());
    let mut ios = app("Demo", &exe);
    ios.platform = Platform::Ios;
    ios.minimum_os_version = Some("17.0".into());
    let bundler = Bundler::with_tools(settings(temp.path(), vec![ios]), FakeTools::new());

    bundler.bundle().await.unwrap();

    let root = temp.path().join("dist/Demo.app");
    assert!(!root.join("Contents").exists());
    assert_eq!(FakeBinary::read(&root.join("Demo")).unwrap().rpaths, vec![IOS_RPATH]);
    assert!(root.join("Frameworks/Foo.framework").is_dir());

    let plist = plist::Value::from_file(root.join("Info.plist")).unwrap();
    assert_eq!(plist_string(&plist, "MinimumOSVersion").as_deref(), Some("17.0"));
    let requires = plist
        .as_dictionary()
        .and_then(|dict| dict.get("LSRequiresIPhoneOS"))
        .and_then(|value| value.as_boolean());
    assert_eq!(requires, Some(true));
}

#[tokio::test]
async fn generated_info_plist_and_resources() {
    let temp = tempfile::tempdir().unwrap();
    let exe = package(temp.path());
    std::fs::create_dir_all(temp.path().join("assets/icons")).unwrap();
    std::fs::write(temp.path().join("assets/one.txt"), b"1").unwrap();
    std::fs::write(temp.path().join("assets/two.txt"), b"2").unwrap();
    std::fs::write(temp.path().join("assets/icons/app.png"), b"png").unwrap();
    let mut demo = app("Demo", &exe);
    demo.minimum_os_version = Some("13.0".into());
    demo.resources = Some(vec!["assets/*.txt".into(), "assets/icons".into()]);
    let bundler = Bundler::with_tools(settings(temp.path(), vec![demo]), FakeTools::new());

    let report = bundler.bundle().await.unwrap();

    let resources = temp.path().join("dist/Demo.app/Contents/Resources");
    assert!(resources.join("one.txt").is_file());
    assert!(resources.join("two.txt").is_file());
    assert!(resources.join("icons/app.png").is_file());
    assert_eq!(report.bundled[0].bundle.resources.len(), 3);

    let plist = plist::Value::from_file(temp.path().join("dist/Demo.app/Contents/Info.plist")).unwrap();
    assert_eq!(plist_string(&plist, "CFBundleExecutable").as_deref(), Some("Demo"));
    assert_eq!(plist_string(&plist, "CFBundleIdentifier").as_deref(), Some("com.example.demo"));
    assert_eq!(plist_string(&plist, "CFBundleVersion").as_deref(), Some("1.0.0"));
    assert_eq!(plist_string(&plist, "LSMinimumSystemVersion").as_deref(), Some("13.0"));
}

#[tokio::test]
async fn info_plist_override_is_copied_verbatim() {
    let temp = tempfile::tempdir().unwrap();
    let exe = package(temp.path());
    let custom = b"<?xml version=\"1.0\"?><plist version=\"1.0\"><dict/></plist>";
    std::fs::write(temp.path().join("Custom.plist"), custom).unwrap();
    let mut demo = app("Demo", &exe);
    demo.info_plist = Some("Custom.plist".into());
    let bundler = Bundler::with_tools(settings(temp.path(), vec![demo]), FakeTools::new());

    bundler.bundle().await.unwrap();

    let written = std::fs::read(temp.path().join("dist/Demo.app/Contents/Info.plist")).unwrap();
    assert_eq!(written, custom);
}

#[tokio::test]
async fn overrides_replace_discovery() {
    let temp = tempfile::tempdir().unwrap();
    let exe = package(temp.path());
    let vendor = temp.path().join("vendor");
    framework(&vendor, "Pinned", &[]);
    dylib(&vendor, "libpinned.dylib", &[]);
    let mut demo = app("Demo", &exe);
    demo.frameworks = Some(vec!["vendor/Pinned.framework".into()]);
    demo.dylibs = Some(vec!["vendor/libpinned.dylib".into()]);
    let bundler = Bundler::with_tools(settings(temp.path(), vec![demo]), FakeTools::new());

    let report = bundler.bundle().await.unwrap();

    let mut names: Vec<String> = report.bundled[0]
        .bundle
        .dependencies
        .iter()
        .map(|d| d.name.clone())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Pinned.framework", "libpinned.dylib"]);
    assert!(!temp.path().join("dist/Demo.app/Contents/Frameworks/Foo.framework").exists());
}

#[tokio::test]
async fn invalid_configuration_fails_before_writing_anything() {
    let temp = tempfile::tempdir().unwrap();
    let exe = package(temp.path());
    let mut demo = app("Demo", &exe);
    demo.identifier = String::new();
    let bundler = Bundler::with_tools(settings(temp.path(), vec![demo]), FakeTools::new());

    let err = bundler.bundle().await.unwrap_err();

    assert!(matches!(err, Error::Configuration { ref app, .. } if app == "Demo"));
    assert!(!temp.path().join("dist/Demo.app").exists());
    assert!(bundler.tools().inspected().is_empty());
}

#[tokio::test]
async fn missing_override_is_a_configuration_error() {
    let temp = tempfile::tempdir().unwrap();
    let exe = package(temp.path());
    let mut demo = app("Demo", &exe);
    demo.dylibs = Some(vec!["vendor/libmissing.dylib".into()]);
    let bundler = Bundler::with_tools(settings(temp.path(), vec![demo]), FakeTools::new());

    let err = bundler.bundle().await.unwrap_err();

    assert!(err.to_string().contains("libmissing.dylib"));
    assert!(!temp.path().join("dist/Demo.app").exists());
}

#[tokio::test]
async fn missing_prebuilt_binary_is_a_build_failure() {
    let temp = tempfile::tempdir().unwrap();
    let demo = app("Demo", &temp.path().join("build/nothing"));
    let bundler = Bundler::with_tools(settings(temp.path(), vec![demo]), FakeTools::new());

    let err = bundler.bundle().await.unwrap_err();

    assert!(err.to_string().contains("bundling app 'Demo'"));
    assert!(err.to_string().contains("does not exist"));
}

fn two_apps(root: &Path, policy: FailurePolicy) -> Bundler<FakeTools> {
    let exe = package(root);
    let broken = AppSettings {
        version: String::new(),
        ..app("Broken", &exe)
    };
    let settings = SettingsBuilder::new()
        .package_dir(root)
        .output_dir(root.join("dist"))
        .apps(vec![broken, app("Demo", &exe)])
        .failure_policy(policy)
        .build()
        .unwrap();
    Bundler::with_tools(settings, FakeTools::new())
}

#[tokio::test]
async fn abort_policy_stops_at_first_failure() {
    let temp = tempfile::tempdir().unwrap();
    let bundler = two_apps(temp.path(), FailurePolicy::Abort);

    assert!(bundler.bundle().await.is_err());
    assert!(!temp.path().join("dist/Demo.app").exists());
}

#[tokio::test]
async fn continue_policy_bundles_the_remaining_apps() {
    let temp = tempfile::tempdir().unwrap();
    let bundler = two_apps(temp.path(), FailurePolicy::Continue);

    let report = bundler.bundle().await.unwrap();

    assert!(!report.is_success());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].app, "Broken");
    assert_eq!(report.bundled.len(), 1);
    assert!(temp.path().join("dist/Demo.app").is_dir());
}

#[tokio::test]
async fn signed_bundle_signs_every_dependency_then_the_bundle() {
    let temp = tempfile::tempdir().unwrap();
    let exe = package(temp.path());
    let mut demo = app("Demo", &exe);
    demo.signing = Some(SigningPolicy {
        enabled: true,
        identity: Some("-".into()),
        ..Default::default()
    });
    let bundler = Bundler::with_tools(settings(temp.path(), vec![demo]), FakeTools::new());

    let report = bundler.bundle().await.unwrap();

    assert_eq!(
        report.bundled[0].bundle.signing,
        SigningOutcome::Signed { dependencies: 2 }
    );
    let calls = bundler.tools().calls();
    let first_sign = calls
        .iter()
        .position(|c| matches!(c, Call::Codesign { .. }))
        .unwrap();
    assert!(
        calls[first_sign..]
            .iter()
            .all(|c| matches!(c, Call::Codesign { .. })),
        "install names were edited after signing started"
    );
    assert_eq!(
        bundler.tools().codesign_targets().last(),
        Some(&temp.path().join("dist/Demo.app"))
    );
}
