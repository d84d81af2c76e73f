//! Definition collector for Java.
//!
//! An outline parser over the token stream: it records packages, imports,
//! types, members, parameters and locals, and skips expressions. Parent QNs are
//! file-relative fragments; the global table qualifies them against the package.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use text_size::TextSize;
use tracing::debug;

use super::builtins::{is_keyword, is_primitive};
use super::lexer::{Token, TokenKind, tokenize};
use crate::base::constants::{
    MOD_FINAL, MOD_PRIVATE, MOD_PUBLIC, MOD_STATIC, MORE_ANONYMOUS_TYPE, MORE_CONSTRUCTOR, MORE_LAMBDA_BLOCK_BODY,
    MORE_LAMBDA_PARAMETERS, MORE_METHOD_REF_RECEIVER, MORE_METHOD_REF_TARGET, MORE_RECORD_COMPONENT, QN_SEPARATOR,
};
use crate::base::{LineIndex, Location};
use crate::error::{AnalysisError, Result};
use crate::lang::Collector;
use crate::model::{CodeElement, ElementKind, Extra};
use crate::symbols::{FileContext, ImportEntry, strip_generics};

const MODIFIER_WORDS: &[&str] = &[
    "public",
    "protected",
    "private",
    "static",
    "final",
    "abstract",
    "default",
    "sealed",
    "synchronized",
    "native",
    "transient",
    "volatile",
    "strictfp",
];

/// Collects definitions and imports from Java sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaCollector;

impl JavaCollector {
    pub fn new() -> Self {
        Self
    }
}

impl Collector for JavaCollector {
    fn collect(&self, path: &str, source: Arc<str>) -> Result<FileContext> {
        let file = {
            let mut parser = OutlineParser::new(path, &source)?;
            parser.parse_compilation_unit()?;
            parser.file
        };
        debug!("collected {} definitions from {}", file.definition_count(), path);
        Ok(file.with_source(source))
    }
}

// ============================================================================
// OUTLINE PARSER
// ============================================================================

/// Modifiers, annotations and doc comment preceding a declaration.
#[derive(Debug, Default)]
struct Modifiers {
    modifiers: Vec<SmolStr>,
    annotations: Vec<SmolStr>,
    doc: Option<String>,
}

impl Modifiers {
    fn has(&self, word: &str) -> bool {
        self.modifiers.iter().any(|m| m == word)
    }

    fn add_implicit(&mut self, word: &'static str) {
        if !self.has(word) {
            self.modifiers.push(SmolStr::new_static(word));
        }
    }
}

struct OutlineParser<'a> {
    path: &'a str,
    /// Tokens without comments
    tokens: Vec<Token<'a>>,
    /// Javadoc immediately preceding each token
    docs: Vec<Option<&'a str>>,
    /// Index of the matching delimiter for every `(`/`)`, `[`/`]`, `{`/`}`
    matching: Vec<Option<usize>>,
    line_index: LineIndex,
    pos: usize,
    file: FileContext,
    /// (parent fragment, segment) -> occurrences
    segments: FxHashMap<(String, String), u32>,
}

impl<'a> OutlineParser<'a> {
    fn new(path: &'a str, source: &'a str) -> Result<Self> {
        let line_index = LineIndex::new(source);
        let mut tokens = Vec::new();
        let mut docs = Vec::new();
        let mut pending_doc = None;
        for token in tokenize(source) {
            match token.kind {
                TokenKind::BlockComment if token.text.starts_with("/**") => pending_doc = Some(token.text),
                TokenKind::LineComment | TokenKind::BlockComment => {}
                _ => {
                    docs.push(pending_doc.take());
                    tokens.push(token);
                }
            }
        }
        let matching = match_delimiters(path, &tokens, &line_index)?;
        Ok(Self {
            path,
            tokens,
            docs,
            matching,
            line_index,
            pos: 0,
            file: FileContext::new(path),
            segments: FxHashMap::default(),
        })
    }

    // ------------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------------

    fn nth(&self, offset: usize) -> Option<Token<'a>> {
        self.tokens.get(self.pos + offset).copied()
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.nth(0).is_some_and(|t| t.is(kind))
    }

    fn at_word(&self, word: &str) -> bool {
        self.nth(0).is_some_and(|t| t.is_word(word))
    }

    fn nth_is(&self, offset: usize, kind: TokenKind) -> bool {
        self.nth(offset).is_some_and(|t| t.is(kind))
    }

    fn at_name(&self) -> bool {
        self.nth(0).is_some_and(|t| t.is(TokenKind::Ident) && !is_keyword(t.text))
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    /// Position just past the delimiter matching the one at `idx`.
    fn after_match(&self, idx: usize) -> usize {
        self.matching[idx].map_or(idx + 1, |m| m + 1)
    }

    fn location(&self, start: usize, end: usize) -> Location {
        let first = self.tokens[start].range.start();
        let last = self.tokens[end].range.end() - TextSize::from(1);
        let (start_line, start_column) = self.line_index.line_col(first).one_based();
        let (end_line, end_column) = self.line_index.line_col(last).one_based();
        Location::new(self.path, start_line, start_column, end_line, end_column)
    }

    fn unique_segment(&mut self, parent: &str, segment: &str) -> String {
        let count = self
            .segments
            .entry((parent.to_string(), segment.to_string()))
            .or_insert(0);
        *count += 1;
        if *count == 1 {
            segment.to_string()
        } else {
            format!("{segment}${count}")
        }
    }

    /// `base$n` with `n` counting from 1 under `parent`; used for unnamed elements.
    fn numbered_segment(&mut self, parent: &str, base: &str) -> String {
        let count = self
            .segments
            .entry((parent.to_string(), base.to_string()))
            .or_insert(0);
        *count += 1;
        format!("{base}${count}")
    }

    // ------------------------------------------------------------------------
    // Compilation unit
    // ------------------------------------------------------------------------

    fn parse_compilation_unit(&mut self) -> Result<()> {
        while let Some(token) = self.nth(0) {
            if token.is_word("package") {
                self.parse_package();
            } else if token.is_word("import") {
                self.parse_import();
            } else {
                let mods = self.parse_modifiers();
                if self.at_type_keyword() {
                    self.parse_type_declaration(mods, "")?;
                } else if self.pos < self.tokens.len() {
                    self.bump();
                }
            }
        }
        Ok(())
    }

    fn parse_package(&mut self) {
        self.bump();
        let mut name = String::new();
        while let Some(token) = self.nth(0) {
            self.bump();
            match token.kind {
                TokenKind::Semicolon => break,
                TokenKind::Ident | TokenKind::Dot => name.push_str(token.text),
                _ => {}
            }
        }
        self.file.set_package_name(name);
    }

    fn parse_import(&mut self) {
        let start = self.pos;
        self.bump();
        let is_static = self.at_word("static");
        if is_static {
            self.bump();
        }
        let mut raw = String::new();
        let mut end = start;
        while let Some(token) = self.nth(0) {
            end = self.pos;
            self.bump();
            match token.kind {
                TokenKind::Semicolon => break,
                TokenKind::Ident | TokenKind::Dot | TokenKind::Operator => raw.push_str(token.text),
                _ => {}
            }
        }

        let location = self.location(start, end);
        let entry = if raw.ends_with('*') {
            ImportEntry::wildcard(raw).with_kind(if is_static {
                ElementKind::Class
            } else {
                ElementKind::Namespace
            })
        } else {
            ImportEntry::single(raw).with_kind(if is_static {
                ElementKind::Field
            } else {
                ElementKind::Class
            })
        };
        let entry = entry.with_static(is_static).with_location(location);
        self.file.add_import(entry.alias.clone(), entry);
    }

    // ------------------------------------------------------------------------
    // Modifiers and types
    // ------------------------------------------------------------------------

    fn parse_modifiers(&mut self) -> Modifiers {
        let mut mods = Modifiers {
            doc: self.docs.get(self.pos).copied().flatten().map(clean_doc),
            ..Modifiers::default()
        };
        loop {
            let Some(token) = self.nth(0) else { break };
            if token.is(TokenKind::At) && !self.nth(1).is_some_and(|t| t.is_word("interface")) {
                self.bump();
                let name = self.parse_qualified_name();
                if self.at(TokenKind::LParen) {
                    self.pos = self.after_match(self.pos);
                }
                if !name.is_empty() {
                    mods.annotations.push(SmolStr::new(name));
                }
            } else if token.is_word("non")
                && self.nth_is(1, TokenKind::Operator)
                && self.nth(2).is_some_and(|t| t.is_word("sealed"))
            {
                self.pos += 3;
                mods.modifiers.push(SmolStr::new_static("non-sealed"));
            } else if token.is(TokenKind::Ident) && MODIFIER_WORDS.contains(&token.text) {
                // `default` as a switch label is not a modifier; that only occurs in bodies.
                self.bump();
                mods.modifiers.push(SmolStr::new(token.text));
            } else {
                break;
            }
        }
        mods
    }

    fn parse_qualified_name(&mut self) -> String {
        let mut name = String::new();
        while let Some(token) = self.nth(0) {
            match token.kind {
                TokenKind::Ident if name.is_empty() || name.ends_with('.') => name.push_str(token.text),
                TokenKind::Dot if !name.is_empty() && !name.ends_with('.') && self.nth_is(1, TokenKind::Ident) => {
                    name.push('.')
                }
                _ => break,
            }
            self.bump();
        }
        name
    }

    fn at_type_keyword(&self) -> bool {
        let Some(token) = self.nth(0) else {
            return false;
        };
        if token.is_word("class") || token.is_word("interface") || token.is_word("enum") {
            return self.nth(1).is_some_and(|t| t.is(TokenKind::Ident));
        }
        if token.is_word("record") {
            return self.nth(1).is_some_and(|t| t.is(TokenKind::Ident))
                && (self.nth_is(2, TokenKind::LParen) || self.nth_is(2, TokenKind::Lt));
        }
        token.is(TokenKind::At) && self.nth(1).is_some_and(|t| t.is_word("interface"))
    }

    /// A type as written: `java.util.Map<K,List<V>>[]`, `String...`.
    fn parse_type(&mut self) -> Option<String> {
        let save = self.pos;
        while self.at(TokenKind::At) {
            self.bump();
            self.parse_qualified_name();
        }
        let first = self.nth(0)?;
        if !first.is(TokenKind::Ident) || (is_keyword(first.text) && !is_primitive(first.text)) {
            self.pos = save;
            return None;
        }

        let mut text = self.parse_qualified_name();
        if self.at(TokenKind::Lt) {
            let mut depth = 0usize;
            let mut previous_word = false;
            while let Some(token) = self.nth(0) {
                match token.kind {
                    TokenKind::Lt => depth += 1,
                    TokenKind::Gt => depth -= 1,
                    TokenKind::Ident | TokenKind::Dot | TokenKind::Comma | TokenKind::Question => {}
                    TokenKind::LBracket | TokenKind::RBracket | TokenKind::Operator => {}
                    _ => {
                        self.pos = save;
                        return None;
                    }
                }
                let is_word = token.is(TokenKind::Ident);
                if is_word && previous_word {
                    text.push(' ');
                }
                previous_word = is_word;
                text.push_str(token.text);
                self.bump();
                if depth == 0 {
                    break;
                }
            }
            if depth != 0 {
                self.pos = save;
                return None;
            }
        }
        while self.at(TokenKind::LBracket) && self.nth_is(1, TokenKind::RBracket) {
            text.push_str("[]");
            self.pos += 2;
        }
        if self.at(TokenKind::Ellipsis) {
            text.push_str("...");
            self.bump();
        }
        Some(text)
    }

    fn parse_type_list(&mut self) -> Vec<String> {
        let mut types = Vec::new();
        while let Some(ty) = self.parse_type() {
            types.push(ty);
            if !self.at(TokenKind::Comma) {
                break;
            }
            self.bump();
        }
        types
    }

    /// Skip a `<...>` list; stops early at tokens that cannot appear inside one.
    fn skip_angles(&mut self) {
        let mut depth = 0usize;
        while let Some(token) = self.nth(0) {
            match token.kind {
                TokenKind::Lt => depth += 1,
                TokenKind::Gt => depth = depth.saturating_sub(1),
                TokenKind::LBrace | TokenKind::Semicolon | TokenKind::LParen => return,
                _ => {}
            }
            self.bump();
            if depth == 0 {
                return;
            }
        }
    }

    // ------------------------------------------------------------------------
    // Type declarations
    // ------------------------------------------------------------------------

    fn parse_type_declaration(&mut self, mods: Modifiers, parent: &str) -> Result<()> {
        let kind = match self.nth(0) {
            Some(t) if t.is_word("class") => ElementKind::Class,
            Some(t) if t.is_word("interface") => ElementKind::Interface,
            Some(t) if t.is_word("enum") => ElementKind::Enum,
            Some(t) if t.is_word("record") => ElementKind::Class,
            _ => {
                self.bump();
                ElementKind::AnnotationType
            }
        };
        let is_record = self.at_word("record");
        self.bump();

        let name_idx = self.pos;
        let Some(name) = self.nth(0).filter(|t| t.is(TokenKind::Ident)).map(|t| t.text) else {
            return Ok(());
        };
        self.bump();
        if self.at(TokenKind::Lt) {
            self.skip_angles();
        }

        let mut components = Vec::new();
        if is_record && self.at(TokenKind::LParen) {
            let close = self.matching[self.pos].unwrap_or(self.pos);
            self.bump();
            components = self.parse_parameters(close);
            self.pos = close + 1;
        }

        let mut extra = Extra {
            modifiers: mods.modifiers,
            annotations: mods.annotations,
            ..Extra::default()
        };
        loop {
            if self.at_word("extends") {
                self.bump();
                let types = self.parse_type_list();
                if kind == ElementKind::Interface {
                    extra.interfaces.extend(types);
                } else {
                    extra.super_class = types.into_iter().next();
                }
            } else if self.at_word("implements") {
                self.bump();
                extra.interfaces.extend(self.parse_type_list());
            } else if self.at_word("permits") {
                self.bump();
                self.parse_type_list();
            } else {
                break;
            }
        }
        if is_record {
            extra.super_class.get_or_insert_with(|| "Record".to_string());
        }

        // Tolerate anything between the header and the body.
        while !self.at(TokenKind::LBrace) {
            if self.nth(0).is_none() {
                return Err(AnalysisError::collect(self.path, format!("missing body for type `{name}`")));
            }
            self.bump();
        }
        let open = self.pos;
        let close = self.matching[open].unwrap_or(open);

        let segment = self.unique_segment(parent, name);
        let fragment = join(parent, &segment);
        let mut element = CodeElement::new(kind, name)
            .with_location(self.location(name_idx, close))
            .with_extra(extra);
        element.doc = mods.doc;
        self.file.add_definition_with_segment(element, parent, segment);

        for (ty, param_name, idx) in components {
            let mut field = CodeElement::new(ElementKind::Field, param_name).with_location(self.location(idx, idx));
            field.extra.modifiers = vec![SmolStr::new_static(MOD_PRIVATE), SmolStr::new_static(MOD_FINAL)];
            field.extra.value_type = Some(ty);
            field.extra.mores.insert(MORE_RECORD_COMPONENT.to_string(), "true".to_string());
            let segment = self.unique_segment(&fragment, param_name);
            self.file.add_definition_with_segment(field, fragment.as_str(), segment);
        }

        self.parse_class_body(kind, &fragment, name, open, close)?;
        self.pos = close + 1;
        Ok(())
    }

    fn parse_class_body(
        &mut self,
        kind: ElementKind,
        fragment: &str,
        type_name: &str,
        open: usize,
        close: usize,
    ) -> Result<()> {
        self.pos = open + 1;
        if kind == ElementKind::Enum {
            self.parse_enum_constants(fragment, close);
        }

        while self.pos < close {
            if self.at(TokenKind::Semicolon) {
                self.bump();
                continue;
            }
            if self.at(TokenKind::LBrace) {
                self.parse_initializer(fragment, false)?;
                continue;
            }

            let start = self.pos;
            let mut mods = self.parse_modifiers();
            if self.at(TokenKind::LBrace) {
                let is_static = mods.has(MOD_STATIC);
                self.parse_initializer(fragment, is_static)?;
            } else if self.at_type_keyword() {
                if kind == ElementKind::Interface || kind == ElementKind::AnnotationType {
                    mods.add_implicit(MOD_STATIC);
                }
                self.parse_type_declaration(mods, fragment)?;
            } else {
                self.parse_member(mods, kind, fragment, type_name, close)?;
            }
            if self.pos == start {
                self.bump();
            }
        }
        Ok(())
    }

    fn parse_enum_constants(&mut self, fragment: &str, close: usize) {
        while self.pos < close {
            let mods = self.parse_modifiers();
            if !self.at_name() {
                break;
            }
            let idx = self.pos;
            let name = self.tokens[idx].text;
            self.bump();
            if self.at(TokenKind::LParen) {
                self.pos = self.after_match(self.pos);
            }
            let mut end = idx;
            if self.at(TokenKind::LBrace) {
                end = self.matching[self.pos].unwrap_or(self.pos);
                self.pos = end + 1;
            }

            let mut constant = CodeElement::new(ElementKind::EnumConstant, name).with_location(self.location(idx, end));
            constant.extra.modifiers = [MOD_PUBLIC, MOD_STATIC, MOD_FINAL]
                .into_iter()
                .map(SmolStr::new_static)
                .collect();
            constant.extra.annotations = mods.annotations;
            constant.doc = mods.doc;
            let segment = self.unique_segment(fragment, name);
            self.file.add_definition_with_segment(constant, fragment, segment);

            if self.at(TokenKind::Comma) {
                self.bump();
                continue;
            }
            if self.at(TokenKind::Semicolon) {
                self.bump();
            }
            break;
        }
    }

    fn parse_initializer(&mut self, fragment: &str, is_static: bool) -> Result<()> {
        let open = self.pos;
        let close = self.matching[open].unwrap_or(open);
        let mut block = CodeElement::new(ElementKind::ScopeBlock, "block").with_location(self.location(open, close));
        if is_static {
            block.extra.modifiers.push(SmolStr::new_static(MOD_STATIC));
        }
        let segment = self.unique_segment(fragment, "block");
        let block_fragment = join(fragment, &segment);
        self.file.add_definition_with_segment(block, fragment, segment);
        self.parse_body(&block_fragment, open, close)?;
        self.pos = close + 1;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Members
    // ------------------------------------------------------------------------

    fn parse_member(
        &mut self,
        mut mods: Modifiers,
        owner_kind: ElementKind,
        fragment: &str,
        type_name: &str,
        close: usize,
    ) -> Result<()> {
        if self.at(TokenKind::Lt) {
            self.skip_angles();
        }

        let is_constructor = self.nth(0).is_some_and(|t| t.is_word(type_name)) && self.nth_is(1, TokenKind::LParen);
        if is_constructor {
            let name_idx = self.pos;
            self.bump();
            return self.parse_method_rest(mods, fragment, name_idx, None);
        }

        let Some(ty) = self.parse_type() else {
            self.recover(close);
            return Ok(());
        };
        if !self.at_name() {
            self.recover(close);
            return Ok(());
        }
        if self.nth_is(1, TokenKind::LParen) {
            let name_idx = self.pos;
            self.bump();
            return self.parse_method_rest(mods, fragment, name_idx, Some(ty));
        }

        if owner_kind == ElementKind::Interface || owner_kind == ElementKind::AnnotationType {
            for implicit in [MOD_PUBLIC, MOD_STATIC, MOD_FINAL] {
                mods.add_implicit(implicit);
            }
        }
        self.parse_field_declarators(&mods, &ty, fragment, close)
    }

    /// Skip to the end of the current member.
    fn recover(&mut self, close: usize) {
        while self.pos < close {
            match self.tokens[self.pos].kind {
                TokenKind::Semicolon => {
                    self.bump();
                    return;
                }
                TokenKind::LBrace => {
                    self.pos = self.after_match(self.pos);
                    return;
                }
                TokenKind::LParen | TokenKind::LBracket => self.pos = self.after_match(self.pos),
                _ => self.bump(),
            }
        }
    }

    fn parse_field_declarators(&mut self, mods: &Modifiers, ty: &str, fragment: &str, limit: usize) -> Result<()> {
        while self.pos < limit && self.at_name() {
            let idx = self.pos;
            let name = self.tokens[idx].text;
            self.bump();
            let mut value_type = ty.to_string();
            while self.at(TokenKind::LBracket) && self.nth_is(1, TokenKind::RBracket) {
                value_type.push_str("[]");
                self.pos += 2;
            }
            if self.at(TokenKind::Eq) {
                self.bump();
                self.parse_initializer_expression(fragment, limit)?;
            }

            let mut element = CodeElement::new(ElementKind::Field, name).with_location(self.location(idx, idx));
            element.extra.modifiers = mods.modifiers.clone();
            element.extra.annotations = mods.annotations.clone();
            element.extra.value_type = Some(value_type);
            element.doc = mods.doc.clone();
            let segment = self.unique_segment(fragment, name);
            self.file.add_definition_with_segment(element, fragment, segment);

            if self.at(TokenKind::Comma) {
                self.bump();
                continue;
            }
            if self.at(TokenKind::Semicolon) {
                self.bump();
            }
            break;
        }
        Ok(())
    }

    fn parse_method_rest(
        &mut self,
        mods: Modifiers,
        fragment: &str,
        name_idx: usize,
        return_type: Option<String>,
    ) -> Result<()> {
        let name = self.tokens[name_idx].text;
        let params_open = self.pos;
        let params_close = self.matching[params_open].unwrap_or(params_open);
        self.bump();
        let params = self.parse_parameters(params_close);
        self.pos = params_close + 1;
        while self.at(TokenKind::LBracket) && self.nth_is(1, TokenKind::RBracket) {
            self.pos += 2;
        }

        let throws = if self.at_word("throws") {
            self.bump();
            self.parse_type_list()
        } else {
            Vec::new()
        };

        let mut body = None;
        let end = if self.at(TokenKind::LBrace) {
            let close = self.matching[self.pos].unwrap_or(self.pos);
            body = Some((self.pos, close));
            self.pos = close + 1;
            close
        } else {
            // Abstract method or annotation member with `default ...`
            while !self.at(TokenKind::Semicolon) && self.nth(0).is_some() {
                if self.at(TokenKind::LParen) || self.at(TokenKind::LBrace) {
                    self.pos = self.after_match(self.pos);
                } else {
                    self.bump();
                }
            }
            let end = self.pos.min(self.tokens.len() - 1);
            self.bump();
            end
        };

        let param_types: Vec<&str> = params.iter().map(|(ty, _, _)| strip_generics(ty)).collect();
        let segment = self.unique_segment(fragment, &format!("{name}({})", param_types.join(",")));
        let method_fragment = join(fragment, &segment);

        let signature = {
            let rendered: Vec<String> = params.iter().map(|(ty, n, _)| format!("{ty} {n}")).collect();
            match &return_type {
                Some(ret) => format!("{ret} {name}({})", rendered.join(", ")),
                None => format!("{name}({})", rendered.join(", ")),
            }
        };

        let mut element = CodeElement::new(ElementKind::Method, name)
            .with_location(self.location(name_idx, end))
            .with_signature(signature);
        element.doc = mods.doc;
        element.extra = Extra {
            modifiers: mods.modifiers,
            annotations: mods.annotations,
            parameters: params.iter().map(|(ty, _, _)| ty.clone()).collect(),
            return_type,
            throws,
            ..Extra::default()
        };
        if element.extra.return_type.is_none() {
            element.extra.mores.insert(MORE_CONSTRUCTOR.to_string(), "true".to_string());
        }
        self.file.add_definition_with_segment(element, fragment, segment);

        for (ty, param_name, idx) in params {
            let mut param = CodeElement::new(ElementKind::Variable, param_name).with_location(self.location(idx, idx));
            param.extra.value_type = Some(ty);
            let segment = self.unique_segment(&method_fragment, param_name);
            self.file.add_definition_with_segment(param, method_fragment.as_str(), segment);
        }

        if let Some((open, close)) = body {
            self.parse_body(&method_fragment, open, close)?;
            self.pos = close + 1;
        }
        Ok(())
    }

    /// `(type, name, name token)` for each parameter up to `close`.
    fn parse_parameters(&mut self, close: usize) -> Vec<(String, &'a str, usize)> {
        let mut params = Vec::new();
        while self.pos < close {
            self.parse_modifiers();
            let Some(ty) = self.parse_type() else {
                self.bump();
                continue;
            };
            // Receiver parameter `Foo this`
            if self.at_word("this") {
                self.bump();
            } else if self.at_name() {
                let idx = self.pos;
                params.push((ty, self.tokens[idx].text, idx));
                self.bump();
                while self.at(TokenKind::LBracket) && self.nth_is(1, TokenKind::RBracket) {
                    self.pos += 2;
                }
            }
            while self.pos < close && !self.at(TokenKind::Comma) {
                self.bump();
            }
            if self.at(TokenKind::Comma) {
                self.bump();
            }
        }
        params
    }

    // ------------------------------------------------------------------------
    // Bodies
    // ------------------------------------------------------------------------

    /// Record locals, local types, lambdas, method references and anonymous
    /// classes inside the block `open..close`.
    fn parse_body(&mut self, scope: &str, open: usize, close: usize) -> Result<()> {
        self.scan_range(scope, open + 1, close)
    }

    fn scan_range(&mut self, scope: &str, from: usize, to: usize) -> Result<()> {
        self.pos = from;
        while self.pos < to {
            if self.at_statement_start() {
                let save = self.pos;
                let mods = self.parse_modifiers();
                if self.at_type_keyword() {
                    self.parse_type_declaration(mods, scope)?;
                    continue;
                }
                if self.try_local_declaration(&mods, scope, to)? {
                    continue;
                }
                self.pos = save;
            }
            if self.at_lambda() {
                self.parse_lambda(scope, to)?;
                continue;
            }
            if self.at(TokenKind::ColonColon) {
                self.add_method_reference(scope);
            } else if self.at_word("new") && self.try_anonymous_class(scope)? {
                continue;
            }
            self.bump();
        }
        Ok(())
    }

    fn at_statement_start(&self) -> bool {
        let Some(previous) = self.pos.checked_sub(1).map(|i| self.tokens[i]) else {
            return false;
        };
        match previous.kind {
            TokenKind::LBrace | TokenKind::RBrace | TokenKind::Semicolon => true,
            TokenKind::LParen => self
                .pos
                .checked_sub(2)
                .map(|i| self.tokens[i])
                .is_some_and(|t| t.is_word("for") || t.is_word("catch") || t.is_word("try")),
            _ => false,
        }
    }

    /// `Type name (= ...)?(, name ...)*` followed by `;`, `:`, `)` or `=`.
    fn try_local_declaration(&mut self, mods: &Modifiers, scope: &str, close: usize) -> Result<bool> {
        let save = self.pos;
        let Some(ty) = self.parse_type() else {
            return Ok(false);
        };
        let follows = self.nth(1).map(|t| t.kind);
        let declares = self.at_name()
            && matches!(
                follows,
                Some(
                    TokenKind::Eq
                        | TokenKind::Semicolon
                        | TokenKind::Comma
                        | TokenKind::Colon
                        | TokenKind::RParen
                        | TokenKind::LBracket
                )
            );
        if !declares {
            self.pos = save;
            return Ok(false);
        }

        while self.pos < close && self.at_name() {
            let idx = self.pos;
            self.add_local(scope, idx, &ty, Some(mods));
            self.bump();
            while self.at(TokenKind::LBracket) && self.nth_is(1, TokenKind::RBracket) {
                self.pos += 2;
            }
            if self.at(TokenKind::Eq) {
                self.bump();
                self.parse_initializer_expression(scope, close)?;
            }
            if self.at(TokenKind::Comma) {
                self.bump();
                continue;
            }
            break;
        }
        Ok(true)
    }

    /// The expression after `=`, up to the `,`, `;` or `)` that ends the declarator.
    fn parse_initializer_expression(&mut self, scope: &str, limit: usize) -> Result<()> {
        let start = self.pos;
        let end = self.expression_end(start, limit);
        self.scan_range(scope, start, end)?;
        self.pos = end;
        Ok(())
    }

    /// First index at or after `from` holding a top-level `,` `;` or closer.
    fn expression_end(&self, from: usize, limit: usize) -> usize {
        let mut idx = from;
        while idx < limit {
            match self.tokens[idx].kind {
                TokenKind::Comma | TokenKind::Semicolon => return idx,
                TokenKind::RParen | TokenKind::RBrace | TokenKind::RBracket => return idx,
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => idx = self.after_match(idx),
                _ => idx += 1,
            }
        }
        limit
    }

    // ------------------------------------------------------------------------
    // Lambdas, method references, anonymous classes
    // ------------------------------------------------------------------------

    /// `x ->` or `( ... ) ->`, but not a `case A ->` switch rule.
    fn at_lambda(&self) -> bool {
        let Some(token) = self.nth(0) else {
            return false;
        };
        match token.kind {
            TokenKind::Ident => {
                !is_keyword(token.text) && self.nth_is(1, TokenKind::Arrow) && !self.in_case_label(self.pos)
            }
            TokenKind::LParen => self.matching[self.pos]
                .and_then(|close| self.tokens.get(close + 1))
                .is_some_and(|t| t.is(TokenKind::Arrow)),
            _ => false,
        }
    }

    fn in_case_label(&self, idx: usize) -> bool {
        self.tokens[..idx]
            .iter()
            .rev()
            .take_while(|t| {
                matches!(
                    t.kind,
                    TokenKind::Ident | TokenKind::Dot | TokenKind::Comma | TokenKind::Number | TokenKind::String
                )
            })
            .any(|t| t.is_word("case"))
    }

    fn parse_lambda(&mut self, scope: &str, limit: usize) -> Result<()> {
        let start = self.pos;
        let (params, arrow) = if self.at(TokenKind::LParen) {
            let close = self.matching[start].unwrap_or(start);
            self.bump();
            let mut params = self.parse_parameters(close);
            if params.is_empty() {
                params = (start + 1..close)
                    .filter(|&idx| {
                        let token = self.tokens[idx];
                        token.is(TokenKind::Ident)
                            && !is_keyword(token.text)
                            && matches!(self.tokens[idx + 1].kind, TokenKind::Comma | TokenKind::RParen)
                    })
                    .map(|idx| (String::new(), self.tokens[idx].text, idx))
                    .collect();
            }
            (params, close + 1)
        } else {
            (vec![(String::new(), self.tokens[start].text, start)], start + 1)
        };

        let body = arrow + 1;
        let is_block = self.tokens.get(body).is_some_and(|t| t.is(TokenKind::LBrace));
        let end = if is_block {
            self.matching[body].unwrap_or(body)
        } else {
            let stop = self.expression_end(body, limit);
            stop.saturating_sub(1).max(body).min(limit.saturating_sub(1))
        };

        let rendered: Vec<String> = params
            .iter()
            .map(|(ty, name, _)| if ty.is_empty() { name.to_string() } else { format!("{ty} {name}") })
            .collect();
        let rendered = rendered.join(", ");
        let mut lambda = CodeElement::new(ElementKind::Lambda, "lambda")
            .with_location(self.location(start, end))
            .with_signature(format!("({rendered}) -> {}", if is_block { "{...}" } else { "expr" }));
        lambda.extra.mores.insert(MORE_LAMBDA_PARAMETERS.to_string(), rendered);
        lambda.extra.mores.insert(MORE_LAMBDA_BLOCK_BODY.to_string(), is_block.to_string());
        let segment = self.numbered_segment(scope, "lambda");
        let fragment = join(scope, &segment);
        self.file.add_definition_with_segment(lambda, scope, segment);

        for (ty, _, idx) in params {
            self.add_local(&fragment, idx, &ty, None);
        }
        if is_block {
            self.parse_body(&fragment, body, end)?;
        } else {
            self.scan_range(&fragment, body, end + 1)?;
        }
        self.pos = end + 1;
        Ok(())
    }

    /// `Receiver::target` with the `::` at the current position.
    fn add_method_reference(&mut self, scope: &str) {
        let colons = self.pos;
        let receiver_len = self.tokens[..colons]
            .iter()
            .rev()
            .take_while(|t| match t.kind {
                TokenKind::Dot | TokenKind::LBracket | TokenKind::RBracket => true,
                TokenKind::Ident => !is_keyword(t.text) || is_primitive(t.text) || matches!(t.text, "this" | "super"),
                _ => false,
            })
            .count();
        let receiver: String = self.tokens[colons - receiver_len..colons].iter().map(|t| t.text).collect();

        let mut target_idx = colons + 1;
        if self.tokens.get(target_idx).is_some_and(|t| t.is(TokenKind::Lt)) {
            target_idx = self.tokens[target_idx..]
                .iter()
                .position(|t| t.is(TokenKind::Gt))
                .map_or(target_idx, |offset| target_idx + offset + 1);
        }
        let Some(target) = self.tokens.get(target_idx).filter(|t| t.is(TokenKind::Ident)) else {
            return;
        };

        let mut reference = CodeElement::new(ElementKind::MethodReference, "method_ref")
            .with_location(self.location(colons, target_idx))
            .with_signature(format!("{receiver}::{}", target.text));
        reference
            .extra
            .mores
            .insert(MORE_METHOD_REF_RECEIVER.to_string(), receiver);
        reference
            .extra
            .mores
            .insert(MORE_METHOD_REF_TARGET.to_string(), target.text.to_string());
        let segment = self.numbered_segment(scope, "method_ref");
        self.file.add_definition_with_segment(reference, scope, segment);
    }

    /// `new Type(args) { body }`; leaves the position untouched when there is no body.
    fn try_anonymous_class(&mut self, scope: &str) -> Result<bool> {
        let save = self.pos;
        self.bump();
        let Some(ty) = self.parse_type() else {
            self.pos = save;
            return Ok(false);
        };
        let has_body = self.at(TokenKind::LParen)
            && self.matching[self.pos]
                .and_then(|close| self.tokens.get(close + 1))
                .is_some_and(|t| t.is(TokenKind::LBrace));
        if !has_body {
            self.pos = save;
            return Ok(false);
        }

        let args_close = self.matching[self.pos].unwrap_or(self.pos);
        self.scan_range(scope, self.pos + 1, args_close)?;
        let open = args_close + 1;
        let close = self.matching[open].unwrap_or(open);

        let base = strip_generics(&ty).to_string();
        let mut anonymous = CodeElement::new(ElementKind::AnonymousClass, "anonymous")
            .with_location(self.location(open, close))
            .with_signature(format!("anonymous {ty}"));
        anonymous.extra.super_class = Some(ty);
        anonymous.extra.mores.insert(MORE_ANONYMOUS_TYPE.to_string(), base);
        let segment = self.numbered_segment(scope, "anonymous");
        let fragment = join(scope, &segment);
        self.file.add_definition_with_segment(anonymous, scope, segment);

        self.parse_class_body(ElementKind::AnonymousClass, &fragment, "", open, close)?;
        self.pos = close + 1;
        Ok(true)
    }

    fn add_local(&mut self, scope: &str, idx: usize, ty: &str, mods: Option<&Modifiers>) {
        let name = self.tokens[idx].text;
        let mut local = CodeElement::new(ElementKind::Variable, name).with_location(self.location(idx, idx));
        if !ty.is_empty() {
            local.extra.value_type = Some(ty.to_string());
        }
        if let Some(mods) = mods {
            local.extra.modifiers = mods.modifiers.clone();
            local.extra.annotations = mods.annotations.clone();
        }
        let segment = self.unique_segment(scope, name);
        self.file.add_definition_with_segment(local, scope, segment);
    }
}

// ============================================================================
// HELPERS
// ============================================================================

fn join(parent: &str, segment: &str) -> String {
    if parent.is_empty() {
        segment.to_string()
    } else {
        format!("{parent}{QN_SEPARATOR}{segment}")
    }
}

/// Pair up `()`, `[]` and `{}`; any mismatch fails the file.
fn match_delimiters(path: &str, tokens: &[Token<'_>], line_index: &LineIndex) -> Result<Vec<Option<usize>>> {
    let mut matching = vec![None; tokens.len()];
    let mut stack: Vec<usize> = Vec::new();
    let line_of = |idx: usize| line_index.line_col(tokens[idx].range.start()).one_based().0;

    for (idx, token) in tokens.iter().enumerate() {
        let opener = match token.kind {
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => {
                stack.push(idx);
                continue;
            }
            TokenKind::RParen => TokenKind::LParen,
            TokenKind::RBracket => TokenKind::LBracket,
            TokenKind::RBrace => TokenKind::LBrace,
            _ => continue,
        };
        match stack.pop() {
            Some(open) if tokens[open].kind == opener => {
                matching[open] = Some(idx);
                matching[idx] = Some(open);
            }
            _ => {
                return Err(AnalysisError::collect(
                    path,
                    format!("unbalanced `{}` at line {}", token.text, line_of(idx)),
                ));
            }
        }
    }
    if let Some(open) = stack.pop() {
        return Err(AnalysisError::collect(
            path,
            format!("unclosed `{}` at line {}", tokens[open].text, line_of(open)),
        ));
    }
    Ok(matching)
}

/// Strip comment markers and leading `*` from a Javadoc block.
fn clean_doc(raw: &str) -> String {
    let inner = raw.trim_start_matches("/**").trim_end_matches("*/");
    inner
        .lines()
        .map(|line| line.trim().trim_start_matches('*').trim())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
