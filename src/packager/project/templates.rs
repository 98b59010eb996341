//! Files written into a fresh project skeleton.

use crate::packager::AppConfig;
use serde_json::{Value, json};

/// Capacitor major version the skeleton pins.
const CAPACITOR_VERSION: &str = "^6.1.0";

/// Web directory inside the project that `cap sync` copies from.
pub const WEB_DIR: &str = "www";

/// Where icon and splash sources are staged.
pub const RESOURCES_DIR: &str = "resources";

pub const PACKAGE_JSON: &str = "package.json";
pub const CAPACITOR_CONFIG: &str = "capacitor.config.json";

pub fn package_json(config: &AppConfig) -> Value {
    json!({
        "name": config.package_name(),
        "version": config.version_name,
        "private": true,
        "description": format!("{} Android package", config.app_name),
        "scripts": {
            "sync": "cap sync android",
            "build:android": "cap build android"
        },
        "dependencies": {
            "@capacitor/android": CAPACITOR_VERSION,
            "@capacitor/core": CAPACITOR_VERSION
        },
        "devDependencies": {
            "@capacitor/cli": CAPACITOR_VERSION
        }
    })
}

pub fn capacitor_config(config: &AppConfig) -> Value {
    let mut android = json!({
        "allowMixedContent": false,
        "captureInput": true,
        "webContentsDebuggingEnabled": false
    });
    if let Some(color) = &config.background_color {
        android["backgroundColor"] = Value::String(color.clone());
    }

    json!({
        "appId": config.app_id,
        "appName": config.app_name,
        "webDir": WEB_DIR,
        "server": {
            "androidScheme": "https"
        },
        "android": android
    })
}

/// Placeholder page so `cap add android` finds a web entry point before
/// the real assets are copied in.
pub fn placeholder_index(config: &AppConfig) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body></body>\n</html>\n",
        config.app_name
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacitor_config_points_at_web_dir() {
        let mut config = AppConfig::new("com.example.todo", "Todo", "dist");
        config.background_color = Some("#ffffff".into());
        let value = capacitor_config(&config);
        assert_eq!(value["appId"], "com.example.todo");
        assert_eq!(value["webDir"], WEB_DIR);
        assert_eq!(value["android"]["backgroundColor"], "#ffffff");
    }

    #[test]
    fn package_json_depends_on_android_platform() {
        let config = AppConfig::new("com.example.todo", "Todo App", "dist");
        let value = package_json(&config);
        assert_eq!(value["name"], "todo-app");
        assert!(value["dependencies"]["@capacitor/android"].is_string());
        assert!(value["devDependencies"]["@capacitor/cli"].is_string());
    }
}
