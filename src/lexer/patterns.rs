use once_cell::sync::Lazy;
use regex::Regex;

macro_rules! rx {
	($pat:expr) => {
		Lazy::new(|| Regex::new($pat).expect("static directive pattern is valid"))
	};
}

pub static COMMENT_OPEN: &str = "{#";
pub static COMMENT_CLOSE: &str = "#}";

pub static PARENT: Lazy<Regex> = rx!(r"^\{\{\s*parent\(\)\s*\}\}");
pub static VARIABLE: Lazy<Regex> = rx!(r"^\{\{(?P<body>.*?)\}\}");
pub static FOR_START: Lazy<Regex> =
	rx!(r"^\{%\s*for\s+(?P<item>[A-Za-z_][A-Za-z0-9_]*)\s+in\s+(?P<iter>.+?)(?:\s+if\s+(?P<filter>.+?))?\s*%\}");
pub static FOR_END: Lazy<Regex> = rx!(r"^\{%\s*endfor\s*%\}");
pub static IF_START: Lazy<Regex> = rx!(r"^\{%\s*if\s+(?P<pred>.+?)\s*%\}");
pub static ELSEIF: Lazy<Regex> = rx!(r"^\{%\s*elseif\s+(?P<pred>.+?)\s*%\}");
pub static ELSE: Lazy<Regex> = rx!(r"^\{%\s*else\s*%\}");
pub static IF_END: Lazy<Regex> = rx!(r"^\{%\s*endif\s*%\}");
pub static EXTENDS: Lazy<Regex> = rx!(r#"^\{%\s*extends\s+"(?P<path>[^"]*)"\s*%\}"#);
pub static BLOCK_START: Lazy<Regex> = rx!(r"^\{%\s*block\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*%\}");
pub static BLOCK_END: Lazy<Regex> = rx!(r"^\{%\s*endblock\s*%\}");
pub static MACRO_START: Lazy<Regex> =
	rx!(r"^\{%\s*macro\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*\((?P<sig>[^)]*)\)\s*%\}");
pub static MACRO_END: Lazy<Regex> = rx!(r"^\{%\s*endmacro\s*%\}");
pub static IMPORT: Lazy<Regex> =
	rx!(r#"^\{%\s*import\s+"(?P<path>[^"]*)"\s+as\s+(?P<alias>[A-Za-z_][A-Za-z0-9_]*)\s*%\}"#);

/// Matches the start of any directive or comment, used to find the next gap
/// boundary when scanning `TEXT`.
pub static ANY_BRACE: Lazy<Regex> = rx!(r"\{[\{%#]");
