use crate::registry::ComponentDescriptor;
use chrono::NaiveDateTime;
use itertools::Itertools;
use serde_json::Value;

/// Indentation unit of the generated Python.
pub const INDENT: &str = "    ";

/// Imports, dependency packages and helper functions requested by the
/// compiled nodes. Duplicates are dropped when rendering, first occurrence wins.
#[derive(Debug, Default)]
pub struct Requirements {
    imports: Vec<String>,
    dependencies: Vec<String>,
    functions: Vec<String>,
}

impl Requirements {
    pub fn collect(&mut self, descriptor: &dyn ComponentDescriptor, config: &Value) {
        self.dependencies.extend(descriptor.dependencies(config));
        self.imports.extend(descriptor.imports(config));
        self.functions.extend(descriptor.functions(config));
    }

    pub fn imports(&self) -> Vec<&str> {
        dedup(&self.imports)
    }

    pub fn dependencies(&self) -> Vec<&str> {
        dedup(&self.dependencies)
    }

    pub fn functions(&self) -> Vec<&str> {
        dedup(&self.functions)
    }
}

fn dedup(items: &[String]) -> Vec<&str> {
    items
        .iter()
        .map(|s| s.trim_end())
        .filter(|s| !s.trim().is_empty())
        .unique()
        .collect()
}

/// Concatenates the pieces of a compilation into the final script.
pub struct CodeAssembler<'a> {
    tool_name: &'a str,
    timestamp: NaiveDateTime,
}

impl<'a> CodeAssembler<'a> {
    pub fn new(tool_name: &'a str, timestamp: NaiveDateTime) -> Self {
        Self {
            tool_name,
            timestamp,
        }
    }

    /// Builds the script: header, imports, helper functions, then the body.
    ///
    /// With `logger_code` the body is wrapped in a single try/except whose
    /// handler runs the loggers. `observe` is appended as the final line.
    pub fn assemble(
        &self,
        requirements: &Requirements,
        body: &str,
        logger_code: Option<&str>,
        observe: Option<&str>,
    ) -> String {
        let mut out = String::new();
        out.push_str(&format!("# Source code generated by {}\n", self.tool_name));
        out.push_str(&format!(
            "# Date: {}\n",
            self.timestamp.format("%Y-%m-%d %H:%M:%S")
        ));
        out.push_str(&format!(
            "# Additional dependencies: {}\n",
            requirements.dependencies().join(", ")
        ));
        for import in requirements.imports() {
            out.push_str(import);
            out.push('\n');
        }
        for function in requirements.functions() {
            out.push('\n');
            out.push_str(function);
            out.push('\n');
        }
        out.push('\n');

        match logger_code {
            Some(loggers) => out.push_str(&wrap_with_loggers(body, loggers)),
            None => out.push_str(body),
        }
        if let Some(variable) = observe {
            out.push_str(variable);
            out.push('\n');
        }
        out
    }
}

/// Appends one component's code, making sure it ends with a single newline.
pub fn push_block(buffer: &mut String, code: &str) {
    let code = code.trim_end_matches(['\n', '\r']);
    if code.is_empty() {
        return;
    }
    buffer.push_str(code);
    buffer.push('\n');
}

/// Indents every non-blank line by `level` units.
pub fn indent(code: &str, level: usize) -> String {
    let prefix = INDENT.repeat(level);
    code.lines()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{}{}", prefix, line)
            }
        })
        .map(|line| line + "\n")
        .collect()
}

/// Wraps `main` in a try block whose except branch reports the error and
/// runs the logger code.
pub fn wrap_with_loggers(main: &str, loggers: &str) -> String {
    let main = if main.trim().is_empty() {
        format!("{}pass\n", INDENT)
    } else {
        indent(main, 1)
    };
    format!(
        "try:\n{}except Exception as e:\n{}print(f\"An error occurred: {{e}}\")\n{}",
        main,
        INDENT,
        indent(loggers, 1)
    )
}
