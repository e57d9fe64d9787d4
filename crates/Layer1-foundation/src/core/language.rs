//! Language - 지원 언어 목록
//!
//! The execution backend recognizes a fixed set of language tags. Only some
//! of them can run as an interactive session.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Supported language tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Python,
    C,
    Cpp,
    Java,
    Javascript,
}

impl Language {
    /// 모든 언어 (표시 순서)
    pub const ALL: [Language; 5] = [
        Language::Python,
        Language::C,
        Language::Cpp,
        Language::Java,
        Language::Javascript,
    ];

    /// Wire tag (`python`, `cpp`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::Java => "java",
            Language::Javascript => "javascript",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::C => "C",
            Language::Cpp => "C++",
            Language::Java => "Java",
            Language::Javascript => "JavaScript",
        }
    }

    /// 인터랙티브 세션 지원 여부
    pub fn is_interactive(&self) -> bool {
        matches!(self, Language::Python | Language::Javascript)
    }

    /// Source file name the sandbox writes the code into
    pub fn source_file(&self) -> &'static str {
        match self {
            Language::Python => "main.py",
            Language::C => "main.c",
            Language::Cpp => "main.cpp",
            Language::Java => "Main.java",
            Language::Javascript => "main.js",
        }
    }

    /// Guess a language from a local file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "py" => Some(Language::Python),
            "c" | "h" => Some(Language::C),
            "cpp" | "cc" | "cxx" | "hpp" => Some(Language::Cpp),
            "java" => Some(Language::Java),
            "js" | "mjs" | "cjs" => Some(Language::Javascript),
            _ => None,
        }
    }

    /// 새 파일의 기본 코드
    pub fn starter_code(&self) -> &'static str {
        match self {
            Language::Python => "def greet(name):\n    print(f\"Hello, {name}!\")\n\ngreet(\"World\")",
            Language::C => {
                "#include <stdio.h>\n\nint main() {\n    printf(\"Hello from C!\\n\");\n    return 0;\n}"
            }
            Language::Cpp => {
                "#include <iostream>\n\nint main() {\n    std::cout << \"Hello from C++!\" << std::endl;\n    return 0;\n}"
            }
            Language::Java => {
                "public class Main {\n    public static void main(String[] args) {\n        System.out.println(\"Hello from Java!\");\n    }\n}"
            }
            Language::Javascript => {
                "function greet(name) {\n    console.log(`Hello, ${name}!`);\n}\ngreet(\"World\");"
            }
        }
    }
}

impl FromStr for Language {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "python" => Ok(Language::Python),
            "c" => Ok(Language::C),
            "cpp" | "c++" => Ok(Language::Cpp),
            "java" => Ok(Language::Java),
            "javascript" | "js" => Ok(Language::Javascript),
            other => Err(Error::InvalidInput(format!("Unsupported language: {}", other))),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interactive_languages() {
        let interactive: Vec<_> = Language::ALL.iter().filter(|l| l.is_interactive()).collect();
        assert_eq!(interactive, vec![&Language::Python, &Language::Javascript]);
        assert_eq!(Language::default(), Language::Python);
    }

    #[test]
    fn test_wire_tags() {
        assert_eq!(serde_json::to_string(&Language::Cpp).unwrap(), "\"cpp\"");
        let lang: Language = serde_json::from_str("\"javascript\"").unwrap();
        assert_eq!(lang, Language::Javascript);
        assert!(serde_json::from_str::<Language>("\"rust\"").is_err());
    }

    #[test]
    fn test_parse() {
        assert_eq!("C++".parse::<Language>().unwrap(), Language::Cpp);
        assert_eq!(" Python ".parse::<Language>().unwrap(), Language::Python);
        assert!(matches!("go".parse::<Language>(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_from_extension() {
        assert_eq!(Language::from_extension("py"), Some(Language::Python));
        assert_eq!(Language::from_extension(".JS"), Some(Language::Javascript));
        assert_eq!(Language::from_extension("rs"), None);
    }
}
