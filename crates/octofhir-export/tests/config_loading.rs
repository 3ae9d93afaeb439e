use std::{env, fs};

use octofhir_export::config::{TokenEncoding, loader::load_config};

#[test]
fn config_parsing_and_env_overrides_and_validation() {
    let dir = tempfile::tempdir().expect("tmp dir");
    let path = dir.path().join("octofhir-export.toml");

    let toml_content = r#"
patients = ["2000190", "21000177"]
strict = true

[endpoints]
token_url = "https://auth.example.com/token"
fhir_base_url = "https://fhir.example.com/r4"

[credentials]
client_id_file = "secrets/client-id.txt"
private_key_file = "secrets/private.pem"
algorithm = "RS384"

[token]
encoding = "form"

[output]
dir = "bundles"

[logging]
level = "debug"
"#;
    fs::write(&path, toml_content).expect("write toml");

    // 1) Valid config parses, unspecified keys keep their defaults
    let cfg = load_config(path.to_str()).expect("should parse config");
    assert_eq!(cfg.endpoints.token_url, "https://auth.example.com/token");
    assert!(cfg.endpoints.audience.contains("okta.com"));
    assert_eq!(cfg.credentials.algorithm, "RS384");
    assert_eq!(cfg.token.encoding, TokenEncoding::Form);
    assert!(cfg.token.scope.contains("system/MedicationRequest.read"));
    assert_eq!(cfg.output.dir.to_str(), Some("bundles"));
    assert_eq!(cfg.patients, ["2000190", "21000177"]);
    assert!(cfg.strict);

    // 2) Env override should win over file
    unsafe {
        env::set_var("OCTOFHIR_EXPORT__OUTPUT__DIR", "from-env");
    }
    let cfg_env = load_config(path.to_str()).expect("should parse config with env overrides");
    assert_eq!(cfg_env.output.dir.to_str(), Some("from-env"));
    unsafe {
        env::remove_var("OCTOFHIR_EXPORT__OUTPUT__DIR");
    }

    // 3) The top-level patient list and flag can be overridden too
    unsafe {
        env::set_var("OCTOFHIR_EXPORT__PATIENTS", "2000190,36000216");
        env::set_var("OCTOFHIR_EXPORT__STRICT", "false");
    }
    let cfg_env = load_config(path.to_str()).expect("patients from env");
    assert_eq!(cfg_env.patients, ["2000190", "36000216"]);
    assert!(!cfg_env.strict);

    unsafe {
        env::set_var("OCTOFHIR_EXPORT__PATIENTS", "0042");
    }
    let cfg_env = load_config(path.to_str()).expect("single patient from env");
    assert_eq!(cfg_env.patients, ["0042"]);
    unsafe {
        env::remove_var("OCTOFHIR_EXPORT__PATIENTS");
        env::remove_var("OCTOFHIR_EXPORT__STRICT");
    }

    // 4) Invalid values load, and are rejected once overrides are applied
    let bad_path = dir.path().join("bad.toml");
    fs::write(
        &bad_path,
        "[credentials]\nalgorithm = \"HS256\"\n[logging]\nlevel = \"verbose\"\n",
    )
    .expect("write toml");
    let mut bad = load_config(bad_path.to_str()).expect("validation is deferred");
    let err = bad.validate().unwrap_err();
    assert!(err.contains("credentials.algorithm"));
    bad.credentials.algorithm = "RS256".into();
    assert!(bad.validate().unwrap_err().contains("logging.level"));
    bad.logging.level = "debug".into();
    bad.validate().expect("overrides fix the file values");

    // 5) An explicit but missing file is an error
    let missing = dir.path().join("missing.toml");
    assert!(load_config(missing.to_str()).is_err());
}
