//! Info.plist generation.

use crate::bundler::error::{ErrorExt, Result};
use crate::bundler::settings::AppSettings;
use crate::bundler::utils::fs;
use plist::{Dictionary, Value};
use std::path::Path;

/// Builds the Info.plist dictionary for `app`.
pub fn info_plist(app: &AppSettings) -> Dictionary {
    let mut plist = Dictionary::new();
    let mut string = |key: &str, value: &str| {
        plist.insert(key.to_string(), Value::String(value.to_string()));
    };

    string("CFBundleDevelopmentRegion", "en");
    string("CFBundleDisplayName", &app.name);
    string("CFBundleExecutable", &app.name);
    string("CFBundleIdentifier", &app.identifier);
    string("CFBundleInfoDictionaryVersion", "6.0");
    string("CFBundleName", &app.name);
    string("CFBundlePackageType", "APPL");
    string("CFBundleShortVersionString", &app.version);
    string("CFBundleVersion", &app.version);

    plist.insert(
        "CFBundleSupportedPlatforms".to_string(),
        Value::Array(vec![Value::String(
            app.platform.supported_platform().to_string(),
        )]),
    );

    if app.platform.is_macos() {
        if let Some(version) = &app.minimum_os_version {
            plist.insert(
                "LSMinimumSystemVersion".to_string(),
                Value::String(version.clone()),
            );
        }
    } else {
        plist.insert("LSRequiresIPhoneOS".to_string(), Value::Boolean(true));
        if let Some(version) = &app.minimum_os_version {
            plist.insert("MinimumOSVersion".to_string(), Value::String(version.clone()));
        }
    }

    plist
}

/// Writes the bundle's Info.plist to `dest`.
///
/// A configured override (resolved against `base_dir`) is copied verbatim;
/// otherwise one is generated from the app settings.
pub async fn write_info_plist(app: &AppSettings, base_dir: &Path, dest: &Path) -> Result<()> {
    if let Some(custom) = &app.info_plist {
        let custom = if custom.is_absolute() {
            custom.clone()
        } else {
            base_dir.join(custom)
        };
        log::debug!("Copying Info.plist from {}", custom.display());
        return fs::copy_file(&custom, dest).await;
    }

    let plist = Value::Dictionary(info_plist(app));
    let mut xml = Vec::new();
    plist.to_writer_xml(&mut xml)?;
    tokio::fs::write(dest, xml)
        .await
        .fs_context("writing Info.plist", dest)?;
    log::debug!("Generated {}", dest.display());
    Ok(())
}
