//! Language definitions and extension lookup for derived gist languages.

pub struct LanguageDef {
    pub id: &'static str,
    pub name: &'static str,
    pub extensions: &'static [&'static str],
    /// Whether the preview layer has highlighting support for it.
    pub supported: bool,
}

/// Bucket id for files whose extension resolves to nothing.
pub const RAW_LANGUAGE: &str = "raw";

#[rustfmt::skip]
pub const LANGUAGES: &[LanguageDef] = &[
    LanguageDef { id: "javascript", name: "JavaScript", extensions: &["js", "mjs", "cjs"], supported: true },
    LanguageDef { id: "typescript", name: "TypeScript", extensions: &["ts", "mts", "cts"], supported: true },
    LanguageDef { id: "jsx", name: "JSX", extensions: &["jsx"], supported: true },
    LanguageDef { id: "tsx", name: "TSX", extensions: &["tsx"], supported: true },
    LanguageDef { id: "python", name: "Python", extensions: &["py", "pyw"], supported: true },
    LanguageDef { id: "java", name: "Java", extensions: &["java"], supported: true },
    LanguageDef { id: "json", name: "JSON", extensions: &["json", "jsonc"], supported: true },
    LanguageDef { id: "html", name: "HTML", extensions: &["html", "htm"], supported: true },
    LanguageDef { id: "css", name: "CSS", extensions: &["css"], supported: true },
    LanguageDef { id: "scss", name: "SCSS", extensions: &["scss"], supported: true },
    LanguageDef { id: "sass", name: "Sass", extensions: &["sass"], supported: true },
    LanguageDef { id: "less", name: "Less", extensions: &["less"], supported: true },
    LanguageDef { id: "markdown", name: "Markdown", extensions: &["md", "markdown"], supported: true },
    LanguageDef { id: "sql", name: "SQL", extensions: &["sql"], supported: true },
    LanguageDef { id: "yaml", name: "YAML", extensions: &["yaml", "yml"], supported: true },
    LanguageDef { id: "go", name: "Go", extensions: &["go"], supported: true },
    LanguageDef { id: "rust", name: "Rust", extensions: &["rs"], supported: true },
    LanguageDef { id: "cpp", name: "C/C++", extensions: &["c", "h", "cpp", "cc", "cxx", "hpp", "hxx"], supported: true },
    LanguageDef { id: "php", name: "PHP", extensions: &["php"], supported: true },
    LanguageDef { id: "vue", name: "Vue", extensions: &["vue"], supported: true },
    LanguageDef { id: "xml", name: "XML", extensions: &["xml", "svg", "xsl", "xslt"], supported: true },
    LanguageDef { id: "wast", name: "WebAssembly", extensions: &["wast", "wat"], supported: true },
    LanguageDef { id: "nix", name: "Nix", extensions: &["nix"], supported: true },
    LanguageDef { id: "liquid", name: "Liquid", extensions: &["liquid"], supported: true },
    LanguageDef { id: "angular", name: "Angular", extensions: &["ng"], supported: true },
    LanguageDef { id: "shell", name: "Shell/Bash", extensions: &["sh", "bash", "zsh"], supported: false },
    LanguageDef { id: "ruby", name: "Ruby", extensions: &["rb"], supported: false },
    LanguageDef { id: "swift", name: "Swift", extensions: &["swift"], supported: false },
    LanguageDef { id: "kotlin", name: "Kotlin", extensions: &["kt", "kts"], supported: false },
    LanguageDef { id: "scala", name: "Scala", extensions: &["scala"], supported: false },
    LanguageDef { id: "r", name: "R", extensions: &["r"], supported: false },
    LanguageDef { id: "lua", name: "Lua", extensions: &["lua"], supported: false },
    LanguageDef { id: "perl", name: "Perl", extensions: &["perl", "pl"], supported: false },
    LanguageDef { id: "haskell", name: "Haskell", extensions: &["hs"], supported: false },
    LanguageDef { id: "elixir", name: "Elixir", extensions: &["ex", "exs"], supported: false },
    LanguageDef { id: "clojure", name: "Clojure", extensions: &["clj", "cljs"], supported: false },
    LanguageDef { id: "dart", name: "Dart", extensions: &["dart"], supported: false },
    LanguageDef { id: "groovy", name: "Groovy", extensions: &["groovy"], supported: false },
    LanguageDef { id: "powershell", name: "PowerShell", extensions: &["ps1", "psm1"], supported: false },
    LanguageDef { id: "dockerfile", name: "Dockerfile", extensions: &["dockerfile"], supported: false },
    LanguageDef { id: "toml", name: "TOML", extensions: &["toml"], supported: false },
    LanguageDef { id: "graphql", name: "GraphQL", extensions: &["graphql", "gql"], supported: false },
    LanguageDef { id: "protobuf", name: "Protocol Buffers", extensions: &["proto"], supported: false },
];

pub fn language_by_id(id: &str) -> Option<&'static LanguageDef> {
    LANGUAGES.iter().find(|l| l.id == id)
}

/// Resolve an extension to a language id, falling back to [`RAW_LANGUAGE`].
pub fn language_for_extension(ext: &str) -> &'static str {
    let ext = ext.to_ascii_lowercase();
    LANGUAGES
        .iter()
        .find(|l| l.extensions.contains(&ext.as_str()))
        .map(|l| l.id)
        .unwrap_or(RAW_LANGUAGE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_lookup_is_case_insensitive() {
        assert_eq!(language_for_extension("RS"), "rust");
        assert_eq!(language_for_extension("Py"), "python");
    }

    #[test]
    fn unknown_extension_falls_back_to_raw() {
        assert_eq!(language_for_extension("xyz"), RAW_LANGUAGE);
        assert_eq!(language_for_extension(""), RAW_LANGUAGE);
    }

    #[test]
    fn unsupported_languages_still_resolve() {
        assert_eq!(language_for_extension("sh"), "shell");
        assert!(!language_by_id("shell").unwrap().supported);
        assert!(language_by_id("rust").unwrap().supported);
    }
}
