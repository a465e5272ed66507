//! Test fixtures for schema files and templates.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Sample schema YAML written to disk by tests.
#[derive(Clone, Debug)]
pub struct SchemaFixture {
    pub name: String,
    pub content: String,
}

impl SchemaFixture {
    /// One group with a custom imported type.
    pub fn basic() -> Self {
        Self {
            name: "basic".to_string(),
            content: r#"
options:
  go_package: config
types:
  - name: LogLevel
    type: zerolog.Level
    import: github.com/rs/zerolog
groups:
  - name: app
    description: Application settings
    prefix: APP_
    fields:
      - name: http_port
        type: int
        default: "8080"
      - name: log_level
        type: LogLevel
"#
            .trim_start()
            .to_string(),
        }
    }

    /// Two groups, so one can be ignored.
    pub fn two_groups() -> Self {
        Self {
            name: "two_groups".to_string(),
            content: r#"
groups:
  - name: app
    fields:
      - name: name
        type: string
  - name: db
    fields:
      - name: dsn
        type: string
        required: true
"#
            .trim_start()
            .to_string(),
        }
    }

    /// A schema without groups.
    pub fn invalid() -> Self {
        Self {
            name: "invalid".to_string(),
            content: "options:\n  go_package: config\n".to_string(),
        }
    }

    /// Write the fixture as `<dir>/<name>.yaml`.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf> {
        let path = dir.join(format!("{}.yaml", self.name));
        fs::write(&path, &self.content)
            .with_context(|| format!("Failed to write schema fixture {}", path.display()))?;
        Ok(path)
    }
}

/// Template text that renders every group and field of a schema.
pub const LISTING_TEMPLATE: &str = "\
package {{ config.options.go_package | default(value=\"main\") }}
{% for import in imports %}import \"{{ import }}\"
{% endfor %}{% for group in config.groups %}type {{ group.name | pascal }} struct {
{% for field in group.fields %}    {{ field.name | pascal }} {{ field.type }} `env:\"{{ group.prefix }}{{ field.name | snake | upper }}\"`
{% endfor %}}
{% endfor %}";

/// Write `content` as `<dir>/<name>`.
pub fn write_template(dir: &Path, name: &str, content: &str) -> Result<PathBuf> {
    let path = dir.join(name);
    fs::write(&path, content)
        .with_context(|| format!("Failed to write template fixture {}", path.display()))?;
    Ok(path)
}
