//! Grammars bundled with the crate.

use crate::grammar::Grammar;

pub fn css() -> Grammar {
    Grammar::new("css", tree_sitter_css::LANGUAGE.into(), &["css"])
}

pub fn go() -> Grammar {
    Grammar::new("go", tree_sitter_go::LANGUAGE.into(), &["go"])
}

pub fn rust() -> Grammar {
    Grammar::new("rust", tree_sitter_rust::LANGUAGE.into(), &["rs"])
}

pub fn python() -> Grammar {
    Grammar::new("python", tree_sitter_python::LANGUAGE.into(), &["py", "pyi"])
}

pub fn typescript() -> Grammar {
    Grammar::new(
        "typescript",
        tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
        &["ts", "mts", "cts"],
    )
}

pub fn tsx() -> Grammar {
    Grammar::new("tsx", tree_sitter_typescript::LANGUAGE_TSX.into(), &["tsx"])
}

pub fn bash() -> Grammar {
    Grammar::new("bash", tree_sitter_bash::LANGUAGE.into(), &["sh", "bash"])
}

pub fn c() -> Grammar {
    Grammar::new("c", tree_sitter_c::LANGUAGE.into(), &["c", "h"])
}

pub fn cpp() -> Grammar {
    Grammar::new(
        "cpp",
        tree_sitter_cpp::LANGUAGE.into(),
        &["cpp", "cc", "cxx", "hpp", "hh"],
    )
}

pub fn html() -> Grammar {
    Grammar::new("html", tree_sitter_html::LANGUAGE.into(), &["html", "htm"])
}

pub fn java() -> Grammar {
    Grammar::new("java", tree_sitter_java::LANGUAGE.into(), &["java"])
}

pub fn javascript() -> Grammar {
    Grammar::new(
        "javascript",
        tree_sitter_javascript::LANGUAGE.into(),
        &["js", "mjs", "cjs", "jsx"],
    )
}

pub fn ruby() -> Grammar {
    Grammar::new("ruby", tree_sitter_ruby::LANGUAGE.into(), &["rb"])
}

/// Block structure of a Markdown document.
pub fn markdown() -> Grammar {
    Grammar::new("markdown", tree_sitter_md::LANGUAGE.into(), &["md", "markdown"])
}

/// Inline content (emphasis, links, code spans) inside Markdown blocks.
///
/// Claims no extensions: it only makes sense over ranges carved out of a
/// block tree.
pub fn markdown_inline() -> Grammar {
    Grammar::new("markdown_inline", tree_sitter_md::INLINE_LANGUAGE.into(), &[])
}

/// Every bundled grammar.
pub fn all() -> Vec<Grammar> {
    vec![
        css(),
        go(),
        rust(),
        python(),
        typescript(),
        tsx(),
        bash(),
        c(),
        cpp(),
        html(),
        java(),
        javascript(),
        ruby(),
        markdown(),
        markdown_inline(),
    ]
}
