//! Script format conversion for projects configured with `code.lang = "js"`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot convert {file_name}: {message}")]
pub struct ConvertError {
    pub file_name: String,
    pub message: String,
}

/// A module after conversion. The file name may change extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Converted {
    pub file_name: String,
    pub content: String,
}

/// Turns typed modules into their untyped variant.
pub trait ScriptConverter {
    fn to_untyped(&self, file_name: &str, content: &str) -> Result<Converted, ConvertError>;
}

/// Switches `.tsx`/`.ts` to `.jsx`/`.js` and drops type-only imports.
///
/// Suitable for generator output that keeps type annotations confined to
/// `import type` statements.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtensionConverter;

impl ScriptConverter for ExtensionConverter {
    fn to_untyped(&self, file_name: &str, content: &str) -> Result<Converted, ConvertError> {
        let file_name = if let Some(stem) = file_name.strip_suffix(".tsx") {
            format!("{stem}.jsx")
        } else if let Some(stem) = file_name.strip_suffix(".ts") {
            format!("{stem}.js")
        } else if file_name.ends_with(".jsx") || file_name.ends_with(".js") {
            file_name.to_owned()
        } else {
            return Err(ConvertError {
                file_name: file_name.to_owned(),
                message: "not a script module".into(),
            });
        };

        let content = content
            .split_inclusive('\n')
            .filter(|line| !line.trim_start().starts_with("import type "))
            .collect();

        Ok(Converted { file_name, content })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn switches_extensions() {
        let c = ExtensionConverter.to_untyped("PlasmicButton.tsx", "x").unwrap();
        assert_eq!(c.file_name, "PlasmicButton.jsx");
        let c = ExtensionConverter.to_untyped("icons/Star.ts", "x").unwrap();
        assert_eq!(c.file_name, "icons/Star.js");
    }

    #[test]
    fn drops_type_only_imports() {
        let src = "import * as React from \"react\";\nimport type { Props } from \"./types\";\nexport default 1;\n";
        let c = ExtensionConverter.to_untyped("A.tsx", src).unwrap();
        assert_eq!(c.content, "import * as React from \"react\";\nexport default 1;\n");
    }

    #[test]
    fn rejects_non_script_files() {
        let err = ExtensionConverter.to_untyped("site.css", "").unwrap_err();
        assert_eq!(err.file_name, "site.css");
    }
}
