use ferry_config::FerryConfigLoader;
use serial_test::serial;
use std::{fs, path::PathBuf};
use tempfile::TempDir;

/// Helper to write a YAML file in a temp dir and return its path.
fn write_yaml(tmp: &TempDir, name: &str, yaml: &str) -> PathBuf {
    let p = tmp.path().join(name);
    fs::write(&p, yaml).expect("write yaml");
    p
}

const BASE_YAML: &str = r##"
vendor:
  base_url: "https://vendor.example.com"
  sign_in_path: "/users/sign_in"
  auth_token_path: "/network_authentication/edit"
  order_new_path: "/url_checks/new"
  orders_path: "/orders"
  export_path_template: "/orders/{order_id}/download_export"
  credentials:
    email: "${FERRY_VENDOR_EMAIL}"
    password: "${FERRY_VENDOR_PASSWORD}"
  selectors:
    email_input: { by: id, target: user_email }
    password_input: { by: id, target: user_password }
    token_input: { by: css, target: "input[type='text']" }
    token_submit: { by: xpath, target: "//button[normalize-space(text())='Update']" }
    lead_url_input: { by: css, target: "textarea[name='check[url]']" }
    check_button: { by: xpath, target: "//a[@data-action='order-creation#checkUrl']" }
    leads_limit_input: { by: id, target: order_limit }
    create_order_button: { by: xpath, target: "//input[@type='submit']" }
    order_item: { by: css, target: "#order_items li:first-child" }
intake:
  form_url: "https://automation.example.com/form/abc123"
download:
  dir: "/tmp/ferry-downloads"
  timeout_secs: 60
"##;

#[test]
#[serial]
fn loads_full_config_with_env_credentials() {
    temp_env::with_vars(
        [
            ("FERRY_VENDOR_EMAIL", Some("ops@example.com")),
            ("FERRY_VENDOR_PASSWORD", Some("from-the-env")),
        ],
        || {
            let tmp = TempDir::new().unwrap();
            let p = write_yaml(&tmp, "leadferry.yaml", BASE_YAML);

            let config = FerryConfigLoader::new()
                .with_file(p)
                .load()
                .expect("load system config");

            assert_eq!(config.vendor.credentials.email, "ops@example.com");
            assert_eq!(config.vendor.credentials.password, "from-the-env");
            assert_eq!(config.download.timeout_secs, 60);
            // Unset knobs fall back to defaults.
            assert_eq!(config.download.settle_secs, 3);
            assert_eq!(config.server.port, 8000);
            assert!(config.browser.headless);
            assert!(config.intake.delete_after_upload);
        },
    );
}

#[test]
#[serial]
fn inline_yaml_overrides_merge() {
    temp_env::with_vars(
        [
            ("FERRY_VENDOR_EMAIL", Some("ops@example.com")),
            ("FERRY_VENDOR_PASSWORD", Some("pw")),
        ],
        || {
            let config = FerryConfigLoader::new()
                .with_yaml_str(BASE_YAML)
                .with_yaml_str("browser:\n  headless: false\nserver:\n  port: 9100\n")
                .load()
                .expect("load merged config");

            assert!(!config.browser.headless);
            assert_eq!(config.server.port, 9100);
            assert_eq!(
                config.vendor.export_url("77"),
                "https://vendor.example.com/orders/77/download_export"
            );
        },
    );
}

#[test]
#[serial]
fn environment_overrides_win_over_file_values() {
    temp_env::with_vars(
        [
            ("FERRY_VENDOR_EMAIL", Some("ops@example.com")),
            ("FERRY_VENDOR_PASSWORD", Some("pw")),
            ("FERRY_SERVER__PORT", Some("9100")),
            ("FERRY_BROWSER__HEADLESS", Some("false")),
            ("FERRY_DOWNLOAD__TIMEOUT_SECS", Some("15")),
        ],
        || {
            let config = FerryConfigLoader::new()
                .with_yaml_str(BASE_YAML)
                .with_yaml_str("server:\n  port: 8000\n")
                .load()
                .expect("load config with env overrides");

            assert_eq!(config.server.port, 9100);
            assert!(!config.browser.headless);
            // The file said 60; the environment has the last word.
            assert_eq!(config.download.timeout_secs, 15);
        },
    );
}

#[test]
#[serial]
fn missing_vendor_section_is_an_error() {
    let err = FerryConfigLoader::new()
        .with_yaml_str("intake:\n  form_url: \"https://example.com\"\n")
        .load()
        .unwrap_err();
    let msg = err.to_string();
    assert!(msg.contains("vendor"), "unexpected error: {msg}");
}
