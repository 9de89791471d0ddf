use super::PackageDescriptor;
use crate::Result;
use camino::Utf8Path;
use ohno::IntoAppError;
use std::fs;

/// Load descriptors produced by another discovery tool from a JSON or YAML file.
///
/// The document is a list of descriptors. Relative package paths are resolved
/// against the directory holding the file.
pub fn load(path: &Utf8Path) -> Result<Vec<PackageDescriptor>> {
    let text = fs::read_to_string(path).into_app_err_with(|| format!("reading descriptor file '{path}'"))?;

    let mut descriptors: Vec<PackageDescriptor> = match path.extension() {
        Some("yaml" | "yml") => serde_yaml::from_str(&text).into_app_err_with(|| format!("parsing descriptor file '{path}'"))?,
        _ => serde_json::from_str(&text).into_app_err_with(|| format!("parsing descriptor file '{path}'"))?,
    };

    let base = path.parent().unwrap_or_else(|| Utf8Path::new(""));
    for descriptor in &mut descriptors {
        if descriptor.path.is_relative() {
            descriptor.path = base.join(&descriptor.path);
        }
    }

    Ok(descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::DependencyKind;
    use camino::Utf8PathBuf;

    fn write_temp(dir: &tempfile::TempDir, name: &str, contents: &str) -> Utf8PathBuf {
        let path = Utf8PathBuf::try_from(dir.path().join(name)).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(
            &dir,
            "packages.json",
            r#"[
                {"name": "a", "path": "/ws/a", "type": "cmake", "dependencies": {"build": ["b"]}},
                {"name": "b", "path": "/ws/b", "type": "cmake"}
            ]"#,
        );

        let descriptors = load(&path).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].name, "a");
        assert!(descriptors[0].dependencies.of_kind(DependencyKind::Build).contains("b"));
        assert!(descriptors[1].metadata.is_empty());
    }

    #[test]
    fn test_load_yaml_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(
            &dir,
            "packages.yaml",
            "- name: a\n  path: src/a\n  type: ros.ament_python\n  metadata:\n    maintainers:\n      - Ada\n      - Grace\n",
        );

        let descriptors = load(&path).unwrap();
        assert_eq!(descriptors.len(), 1);
        assert_eq!(descriptors[0].path, path.parent().unwrap().join("src/a"));
        assert_eq!(descriptors[0].metadata["maintainers"], serde_json::json!(["Ada", "Grace"]));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load(Utf8Path::new("/definitely/not/here/packages.json"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_temp(&dir, "packages.json", "{ not json");

        let result = load(&path);
        assert!(result.is_err());
    }
}
