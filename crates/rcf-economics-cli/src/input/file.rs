use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};

/// Read a JSON or YAML file and deserialise into a typed struct.
///
/// `.yaml` / `.yml` files are parsed as YAML, everything else as JSON.
pub fn read_structured<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    log::debug!("read {} bytes from {}", contents.len(), canonical.display());

    let value: T = if is_yaml(&canonical) {
        serde_yaml::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    } else {
        serde_json::from_str(&contents)
            .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?
    };
    Ok(value)
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Resolve and validate the path, preventing directory traversal.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rcf_economics_core::rcf::economics::FacilityInput;
    use rust_decimal_macros::dec;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("rcf-cli-{}-{}", std::process::id(), name));
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_reads_yaml_by_extension() {
        let path = write_temp(
            "facility.yaml",
            "facility_size: 1000000\ndrawn_fraction: 0.5\ncln:\n  size: 250000\n",
        );
        let f: FacilityInput = read_structured(path.to_str().unwrap()).unwrap();
        assert_eq!(f.facility_size, dec!(1_000_000));
        assert_eq!(f.cln.unwrap().size, dec!(250_000));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_reads_json() {
        let path = write_temp("facility.json", r#"{ "drawn_fraction": "0.2" }"#);
        let f: FacilityInput = read_structured(path.to_str().unwrap()).unwrap();
        assert_eq!(f.drawn_fraction, dec!(0.2));
        assert_eq!(f.facility_size, dec!(2_000_000_000));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_missing_file_errors() {
        let err = read_structured::<FacilityInput>("/definitely/not/here.json").unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }
}
