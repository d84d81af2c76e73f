//! Relation extractor for Java.
//!
//! Declaration relations come from the collected definitions (supertypes,
//! signatures, annotations). Behavioral relations come from a token scan of
//! executable bodies and field initializers; every name is resolved through the
//! resolver and falls back to an external stand-in.

use std::cmp::Reverse;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::{debug, trace};

use super::builtins::{is_keyword, is_primitive};
use super::lexer::{Token, TokenKind, tokenize};
use crate::base::constants::{MORE_CONSTRUCTOR, QN_SEPARATOR};
use crate::base::{LineIndex, Location, TextSize};
use crate::error::{AnalysisError, Result};
use crate::lang::Extractor;
use crate::model::{CodeElement, DependencyRelation, DependencyType, ElementKind};
use crate::symbols::{DefinitionEntry, FileContext, GlobalContext, SymbolIndex, SymbolResolver, strip_generics};

/// Extracts typed relations from Java sources.
#[derive(Debug, Clone, Copy, Default)]
pub struct JavaExtractor;

impl JavaExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Extractor for JavaExtractor {
    fn extract(&self, file: &FileContext, global: &GlobalContext) -> Result<Vec<DependencyRelation>> {
        let source = file
            .source()
            .cloned()
            .ok_or_else(|| AnalysisError::extract(file.path(), "source text was not retained"))?;
        let index = global.read();
        let mut walker = RelationWalker::new(file, &index, global.resolver(), &source);
        walker.declaration_relations();
        walker.import_relations();
        walker.body_relations();
        debug!("extracted {} relations from {}", walker.relations.len(), file.path());
        Ok(walker.relations)
    }
}

// ============================================================================
// WALKER
// ============================================================================

/// What a `receiver.member` receiver turned out to be.
enum Receiver {
    /// A type in the analyzed tree
    InTree(String),
    /// A type outside the tree, by its best-known QN
    External(String),
    Unknown,
}

struct RelationWalker<'a> {
    file: &'a FileContext,
    index: &'a SymbolIndex,
    resolver: &'a dyn SymbolResolver,
    source: &'a str,
    line_index: LineIndex,
    file_element: Arc<CodeElement>,
    definitions: Vec<Arc<DefinitionEntry>>,
    /// Definitions that can enclose code, with a location
    containers: Vec<Arc<DefinitionEntry>>,
    /// Start positions of declared names; those tokens are not references
    declared_at: FxHashSet<(u32, u32)>,
    relations: Vec<DependencyRelation>,
}

impl<'a> RelationWalker<'a> {
    fn new(file: &'a FileContext, index: &'a SymbolIndex, resolver: &'a dyn SymbolResolver, source: &'a str) -> Self {
        let definitions = file.definitions();
        let containers = definitions
            .iter()
            .filter(|d| d.kind().is_container() && d.element.location.is_some())
            .cloned()
            .collect();
        let declared_at = definitions
            .iter()
            .filter_map(|d| d.element.location.as_ref())
            .map(|l| (l.start_line, l.start_column))
            .collect();
        let file_element = index
            .find_by_qualified_name(file.path())
            .map(|e| e.element.clone())
            .unwrap_or_else(|| {
                Arc::new(CodeElement::sugar(ElementKind::File, file.path(), file.path()).with_path(file.path()))
            });

        Self {
            file,
            index,
            resolver,
            source,
            line_index: LineIndex::new(source),
            file_element,
            definitions,
            containers,
            declared_at,
            relations: Vec::new(),
        }
    }

    fn push(
        &mut self,
        kind: DependencyType,
        source: Arc<CodeElement>,
        target: Arc<CodeElement>,
        location: Option<Location>,
    ) {
        let mut relation = DependencyRelation::new(kind, source, target);
        relation.location = location;
        trace!("[EXTRACT] {}", relation);
        self.relations.push(relation);
    }

    // ------------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------------

    fn declaration_relations(&mut self) {
        let definitions = self.definitions.clone();
        for def in &definitions {
            let element = def.element.clone();
            let location = element.location.clone();

            if !def.parent_qn.is_empty() && def.parent_qn != self.file.package_name() {
                if let Some(parent) = self.index.find_by_qualified_name(&def.parent_qn) {
                    let parent = parent.element.clone();
                    self.push(DependencyType::Contain, parent, element.clone(), location.clone());
                }
            }

            for annotation in &element.extra.annotations {
                let target = self.resolve_named(annotation, ElementKind::AnnotationType);
                self.push(DependencyType::Annotation, element.clone(), target, location.clone());
            }

            if element.kind.is_type() {
                if let Some(super_class) = &element.extra.super_class {
                    // An anonymous class names either a class or an interface
                    let implements = element.kind == ElementKind::AnonymousClass
                        && self
                            .resolve_type(super_class, ElementKind::Class)
                            .is_some_and(|t| t.kind == ElementKind::Interface);
                    let kind = if implements {
                        DependencyType::Implement
                    } else {
                        DependencyType::Extend
                    };
                    self.type_relation(kind, &element, super_class, ElementKind::Class);
                }
                let interface_relation = if element.kind == ElementKind::Interface {
                    DependencyType::Extend
                } else {
                    DependencyType::Implement
                };
                for interface in &element.extra.interfaces {
                    self.type_relation(interface_relation, &element, interface, ElementKind::Interface);
                }
            }

            if element.kind == ElementKind::Method {
                for parameter in &element.extra.parameters {
                    self.type_relation(DependencyType::Parameter, &element, parameter, ElementKind::Class);
                }
                if let Some(return_type) = &element.extra.return_type {
                    self.type_relation(DependencyType::Return, &element, return_type, ElementKind::Class);
                }
                for thrown in &element.extra.throws {
                    self.type_relation(DependencyType::Throw, &element, thrown, ElementKind::Class);
                }
                self.override_relation(def);
            }

            if matches!(
                element.kind,
                ElementKind::Field | ElementKind::Variable | ElementKind::Constant
            ) {
                if let Some(value_type) = &element.extra.value_type {
                    for argument in type_arguments(value_type) {
                        if let Some(target) = self.resolve_type(&argument, ElementKind::Class) {
                            self.push(DependencyType::TypeArg, element.clone(), target, location.clone());
                        }
                    }
                }
            }
        }
    }

    /// A relation to the base of `text`, plus type-arg relations to its generic arguments.
    fn type_relation(&mut self, kind: DependencyType, source: &Arc<CodeElement>, text: &str, fallback: ElementKind) {
        let location = source.location.clone();
        if let Some(target) = self.resolve_type(text, fallback) {
            self.push(kind, source.clone(), target, location.clone());
        }
        for argument in type_arguments(text) {
            if let Some(target) = self.resolve_type(&argument, ElementKind::Class) {
                self.push(DependencyType::TypeArg, source.clone(), target, location.clone());
            }
        }
    }

    fn override_relation(&mut self, def: &Arc<DefinitionEntry>) {
        let element = &def.element;
        if element.is_static() || element.extra.mores.contains_key(MORE_CONSTRUCTOR) {
            return;
        }
        let Some(hit) = self
            .resolver
            .resolve_in_ancestors(self.index, self.file, &def.parent_qn, &element.name, false)
        else {
            return;
        };
        if hit.kind() != ElementKind::Method {
            return;
        }
        let arity = Some(element.extra.parameters.len());
        let overridden = pick_overload(self.index.find_members(&hit.parent_qn, &element.name), arity).unwrap_or(hit);
        self.push(
            DependencyType::Override,
            element.clone(),
            overridden.element.clone(),
            element.location.clone(),
        );
    }

    fn import_relations(&mut self) {
        for import in self.file.imports() {
            let target = if import.is_wildcard {
                self.index
                    .find_by_qualified_name(import.prefix())
                    .map(|e| e.element.clone())
            } else {
                self.index
                    .find_by_qualified_name(&import.raw_path)
                    .cloned()
                    .or_else(|| {
                        let (owner, member) = import.raw_path.rsplit_once(QN_SEPARATOR)?;
                        self.index.find_members(owner, member).into_iter().next()
                    })
                    .map(|e| e.element.clone())
            };
            let target = target.unwrap_or_else(|| {
                let qn = import.prefix().to_string();
                let name = qn.rsplit(QN_SEPARATOR).next().unwrap_or(&qn).to_string();
                Arc::new(CodeElement::external(import.kind, name, qn))
            });
            self.push(DependencyType::Import, self.file_element.clone(), target, import.location.clone());
        }
    }

    // ------------------------------------------------------------------------
    // Bodies
    // ------------------------------------------------------------------------

    fn body_relations(&mut self) {
        let source = self.source;
        let tokens: Vec<Token<'_>> = tokenize(source).into_iter().filter(|t| !t.is_trivia()).collect();
        let mut in_initializer = false;
        let mut i = 0;

        while i < tokens.len() {
            let token = tokens[i];
            let (line, column) = self.position(&token);
            let container = self.innermost_container(line, column);

            let Some(container) = container else {
                if token.is_word("package") || token.is_word("import") {
                    while i < tokens.len() && !tokens[i].is(TokenKind::Semicolon) {
                        i += 1;
                    }
                }
                i += 1;
                continue;
            };

            if !container.kind().is_executable() {
                match token.kind {
                    TokenKind::Eq => in_initializer = true,
                    TokenKind::Semicolon | TokenKind::LBrace | TokenKind::RBrace => in_initializer = false,
                    _ => {}
                }
                if !in_initializer {
                    i += 1;
                    continue;
                }
            }

            i = self.scan_token(&tokens, i, &container);
        }
    }

    /// Handle the token at `i`; returns the index of the next token to look at.
    fn scan_token(&mut self, tokens: &[Token<'_>], i: usize, container: &Arc<DefinitionEntry>) -> usize {
        let token = tokens[i];
        let previous = i.checked_sub(1).map(|p| tokens[p]);
        let next = tokens.get(i + 1).copied();

        if token.is_word("new") {
            return self.scan_creation(tokens, i, container);
        }
        if token.is(TokenKind::LParen) {
            return self.scan_cast(tokens, i, container).unwrap_or(i + 1);
        }
        if !token.is(TokenKind::Ident) || is_keyword(token.text) {
            return i + 1;
        }
        if self.declared_at.contains(&self.position(&token)) {
            return i + 1;
        }
        if previous.is_some_and(|p| p.is(TokenKind::At) || p.is(TokenKind::ColonColon)) {
            return i + 1;
        }

        if previous.is_some_and(|p| p.is(TokenKind::Dot)) {
            self.scan_member_access(tokens, i, container);
            return i + 1;
        }

        let name = token.text;
        let location = Some(self.location(&token));
        let is_static = self.in_static_context(container);

        if next.is_some_and(|n| n.is(TokenKind::LParen)) {
            let arity = count_arguments(tokens, i + 1);
            let target = self.resolve_call(container, name, arity);
            self.push(DependencyType::Call, container.element.clone(), target, location);
            return i + 1;
        }

        // Type positions: `Foo x`, `Foo[] x`, `Foo<Bar> x`
        if next.is_some_and(|n| n.is(TokenKind::Ident))
            || (next.is_some_and(|n| n.is(TokenKind::LBracket))
                && tokens.get(i + 2).is_some_and(|n| n.is(TokenKind::RBracket)))
        {
            return i + 1;
        }

        let hit = self
            .resolver
            .resolve_in_scope_hierarchy(self.index, self.file, container.qualified_name(), name, is_static)
            .or_else(|| self.resolve_outside_scope(name));

        let target = match hit {
            Some(hit) if hit.kind().is_type() || hit.kind() == ElementKind::Namespace => return i + 1,
            Some(hit) => hit.element.clone(),
            // Receivers that are not variables are type or package names
            None if next.is_some_and(|n| n.is(TokenKind::Dot)) => return i + 1,
            None if starts_uppercase(name) => return i + 1,
            None => Arc::new(self.resolver.external_stand_in(self.file, name, ElementKind::Field)),
        };
        let kind = if is_assignment(previous, next) {
            DependencyType::Assign
        } else {
            DependencyType::Use
        };
        self.push(kind, container.element.clone(), target, location);
        i + 1
    }

    /// `new Type(...)` / `new Type[...]`.
    fn scan_creation(&mut self, tokens: &[Token<'_>], i: usize, container: &Arc<DefinitionEntry>) -> usize {
        let mut j = i + 1;
        while tokens.get(j).is_some_and(|t| t.is(TokenKind::At)) {
            j += 2;
        }
        let start = j;
        let mut name = String::new();
        while let Some(t) = tokens.get(j) {
            match t.kind {
                TokenKind::Ident => name.push_str(t.text),
                TokenKind::Dot if tokens.get(j + 1).is_some_and(|n| n.is(TokenKind::Ident)) => name.push('.'),
                _ => break,
            }
            j += 1;
        }
        if name.is_empty() || is_primitive(&name) {
            return j.max(i + 1);
        }
        let location = Some(self.location_between(&tokens[start], &tokens[j - 1]));
        if let Some(target) = self.resolve_type(&name, ElementKind::Class) {
            self.push(DependencyType::Create, container.element.clone(), target, location);
        }
        // Skip the diamond / type arguments of the created type
        if tokens.get(j).is_some_and(|t| t.is(TokenKind::Lt)) {
            let mut depth = 0usize;
            while let Some(t) = tokens.get(j) {
                match t.kind {
                    TokenKind::Lt => depth += 1,
                    TokenKind::Gt => depth -= 1,
                    TokenKind::Ident | TokenKind::Comma | TokenKind::Dot | TokenKind::Question => {}
                    _ => break,
                }
                j += 1;
                if depth == 0 {
                    break;
                }
            }
        }
        j
    }

    /// `(Type) operand`; returns the index after `)` when it is a cast.
    fn scan_cast(&mut self, tokens: &[Token<'_>], i: usize, container: &Arc<DefinitionEntry>) -> Option<usize> {
        let previous = i.checked_sub(1).map(|p| tokens[p]);
        if previous.is_some_and(|p| {
            matches!(p.kind, TokenKind::RParen | TokenKind::RBracket)
                || (p.is(TokenKind::Ident) && !matches!(p.text, "return" | "yield" | "throw" | "case"))
        }) {
            return None;
        }

        let mut j = i + 1;
        let mut name = String::new();
        let mut depth = 0usize;
        while let Some(t) = tokens.get(j) {
            match t.kind {
                TokenKind::Ident if depth == 0 => name.push_str(t.text),
                TokenKind::Dot if depth == 0 => name.push('.'),
                TokenKind::Lt => depth += 1,
                TokenKind::Gt => depth = depth.checked_sub(1)?,
                TokenKind::Ident | TokenKind::Comma | TokenKind::Question | TokenKind::Dot => {}
                TokenKind::LBracket | TokenKind::RBracket if depth == 0 => {}
                TokenKind::RParen if depth == 0 => break,
                _ => return None,
            }
            j += 1;
        }
        let close = j;
        let first = tokens.get(i + 1)?;
        if name.is_empty()
            || !(starts_uppercase(&name) || is_primitive(&name))
            || (is_keyword(first.text) && !is_primitive(first.text))
        {
            return None;
        }
        let operand = tokens.get(close + 1)?;
        let starts_operand = match operand.kind {
            TokenKind::Ident => !is_keyword(operand.text) || matches!(operand.text, "this" | "new" | "super"),
            TokenKind::LParen | TokenKind::Number | TokenKind::String | TokenKind::Char => true,
            TokenKind::Operator => matches!(operand.text, "!" | "~"),
            _ => false,
        };
        if !starts_operand {
            return None;
        }

        if !is_primitive(&name) {
            let location = Some(self.location_between(first, &tokens[close - 1]));
            if let Some(target) = self.resolve_type(&name, ElementKind::Class) {
                self.push(DependencyType::Cast, container.element.clone(), target, location);
            }
        }
        Some(close + 1)
    }

    /// `receiver.member` and `receiver.member(...)`.
    fn scan_member_access(&mut self, tokens: &[Token<'_>], i: usize, container: &Arc<DefinitionEntry>) {
        let token = tokens[i];
        let name = token.text;
        let next = tokens.get(i + 1).copied();
        let previous = tokens.get(i.wrapping_sub(1)).copied();
        let is_call = next.is_some_and(|n| n.is(TokenKind::LParen));
        let arity = if is_call { count_arguments(tokens, i + 1) } else { None };
        let location = Some(self.location(&token));

        // Type positions inside qualified names: `java.util.List<String> xs`
        if !is_call && next.is_some_and(|n| n.is(TokenKind::Ident) || n.is(TokenKind::Lt)) {
            return;
        }

        let receiver_token = i.checked_sub(2).map(|r| tokens[r]);
        let chained = i.checked_sub(3).is_some_and(|r| tokens[r].is(TokenKind::Dot));
        let receiver = match receiver_token {
            Some(r) if r.is_word("this") => self
                .owner_type(container.qualified_name())
                .map_or(Receiver::Unknown, Receiver::InTree),
            Some(r) if r.is_word("super") => {
                let owner = self.owner_type(container.qualified_name());
                let hit = owner.and_then(|owner| {
                    self.resolver
                        .resolve_in_ancestors(self.index, self.file, &owner, name, false)
                });
                let target = match hit {
                    Some(hit) => hit.element.clone(),
                    None => Arc::new(self.resolver.external_stand_in(self.file, name, member_kind(is_call))),
                };
                let kind = access_kind(is_call, previous, next);
                self.push(kind, container.element.clone(), target, location);
                return;
            }
            Some(r) if r.is(TokenKind::Ident) && !chained => self.resolve_receiver(container, r.text),
            _ => Receiver::Unknown,
        };

        let target = match receiver {
            Receiver::InTree(owner) => match self.member_of(&owner, name, arity) {
                Some(hit) => hit.element.clone(),
                None => Arc::new(CodeElement::external(
                    member_kind(is_call),
                    name,
                    self.resolver.build_qualified_name(&owner, name),
                )),
            },
            Receiver::External(owner) => Arc::new(CodeElement::external(
                member_kind(is_call),
                name,
                self.resolver.build_qualified_name(&owner, name),
            )),
            // Unknown receivers on plain accesses are mostly package paths
            Receiver::Unknown if !is_call => return,
            Receiver::Unknown => Arc::new(CodeElement::external(ElementKind::Method, name, name)),
        };
        let kind = access_kind(is_call, previous, next);
        self.push(kind, container.element.clone(), target, location);
    }

    // ------------------------------------------------------------------------
    // Resolution helpers
    // ------------------------------------------------------------------------

    fn resolve_receiver(&self, container: &Arc<DefinitionEntry>, name: &str) -> Receiver {
        let hit = self
            .resolver
            .resolve_in_scope_hierarchy(self.index, self.file, container.qualified_name(), name, false)
            .or_else(|| self.resolve_outside_scope(name));

        if let Some(hit) = hit {
            if hit.kind().is_type() {
                return Receiver::InTree(hit.qualified_name().to_string());
            }
            let Some(value_type) = hit.element.extra.value_type.as_deref() else {
                return Receiver::Unknown;
            };
            return match self.resolve_type(value_type, ElementKind::Class) {
                Some(ty) if ty.is_from_external => Receiver::External(ty.qualified_name.clone()),
                Some(ty) => Receiver::InTree(ty.qualified_name.clone()),
                None => Receiver::Unknown,
            };
        }
        if starts_uppercase(name) {
            let stand_in = self.resolver.external_stand_in(self.file, name, ElementKind::Class);
            return Receiver::External(stand_in.qualified_name);
        }
        Receiver::Unknown
    }

    fn resolve_call(&self, container: &Arc<DefinitionEntry>, name: &str, arity: Option<usize>) -> Arc<CodeElement> {
        let is_static = self.in_static_context(container);
        let hit = self
            .resolver
            .resolve_in_scope_hierarchy(self.index, self.file, container.qualified_name(), name, is_static)
            .filter(|h| matches!(h.kind(), ElementKind::Method | ElementKind::Function))
            .or_else(|| {
                self.resolver
                    .resolve_imported(self.index, self.file, name)
                    .into_iter()
                    .find(|h| matches!(h.kind(), ElementKind::Method | ElementKind::Function))
            });
        match hit {
            Some(hit) => {
                let overloads = self.index.find_members(&hit.parent_qn, name);
                pick_overload(overloads, arity).unwrap_or(hit).element.clone()
            }
            None => Arc::new(self.resolver.external_stand_in(self.file, name, ElementKind::Method)),
        }
    }

    /// Flat lookup for a bare name the scope walk missed; same-file short
    /// names are left out, except types, which any scope may name.
    fn resolve_outside_scope(&self, name: &str) -> Option<Arc<DefinitionEntry>> {
        self.resolver
            .resolve_imported(self.index, self.file, name)
            .into_iter()
            .next()
            .or_else(|| {
                self.file
                    .find_by_short_name(name)
                    .into_iter()
                    .find(|d| d.kind().is_type() && d.kind() != ElementKind::AnonymousClass)
            })
    }

    /// Static methods and initializers, and lambdas nested in them.
    fn in_static_context(&self, container: &Arc<DefinitionEntry>) -> bool {
        let mut current = container.clone();
        loop {
            if current.element.is_static() {
                return true;
            }
            if current.kind() != ElementKind::Lambda {
                return false;
            }
            match self.index.find_by_qualified_name(&current.parent_qn) {
                Some(parent) => current = parent.clone(),
                None => return false,
            }
        }
    }

    /// Member of a type, searching supertypes when the type lacks it.
    fn member_of(&self, owner_qn: &str, name: &str, arity: Option<usize>) -> Option<Arc<DefinitionEntry>> {
        let direct = self.index.find_members(owner_qn, name);
        if !direct.is_empty() {
            return pick_overload(direct, arity);
        }
        let inherited = self
            .resolver
            .resolve_in_ancestors(self.index, self.file, owner_qn, name, false)?;
        let overloads = self.index.find_members(&inherited.parent_qn, name);
        pick_overload(overloads, arity).or(Some(inherited))
    }

    /// Resolve a type as written; `None` for primitives.
    fn resolve_type(&self, text: &str, fallback: ElementKind) -> Option<Arc<CodeElement>> {
        let base = strip_generics(text)
            .trim_end_matches("...")
            .trim_end_matches("[]")
            .trim();
        if base.is_empty() || base == "?" || is_primitive(base) {
            return None;
        }
        Some(self.resolve_named(base, fallback))
    }

    fn resolve_named(&self, name: &str, fallback: ElementKind) -> Arc<CodeElement> {
        self.resolver.resolve_element(self.index, self.file, name, fallback)
    }

    /// Nearest enclosing type of a scope.
    fn owner_type(&self, scope_qn: &str) -> Option<String> {
        let mut current = scope_qn;
        loop {
            let entry = self.index.find_by_qualified_name(current)?;
            if entry.kind().is_type() {
                return Some(current.to_string());
            }
            current = &entry.parent_qn;
        }
    }

    fn innermost_container(&self, line: u32, column: u32) -> Option<Arc<DefinitionEntry>> {
        self.containers
            .iter()
            .filter(|c| c.element.location.as_ref().is_some_and(|l| l.contains(line, column)))
            .min_by_key(|c| {
                let l = c.element.location.as_ref().map(|l| (l.line_span(), Reverse((l.start_line, l.start_column))));
                l.unwrap_or((u32::MAX, Reverse((0, 0))))
            })
            .cloned()
    }

    fn position(&self, token: &Token<'_>) -> (u32, u32) {
        self.line_index.line_col(token.range.start()).one_based()
    }

    fn location(&self, token: &Token<'_>) -> Location {
        self.location_between(token, token)
    }

    fn location_between(&self, first: &Token<'_>, last: &Token<'_>) -> Location {
        let (start_line, start_column) = self.position(first);
        let end = last.range.end() - TextSize::from(1);
        let (end_line, end_column) = self.line_index.line_col(end).one_based();
        Location::new(self.file.path(), start_line, start_column, end_line, end_column)
    }
}

// ============================================================================
// HELPERS
// ============================================================================

/// Names appearing inside the outermost `<...>` of a type text.
fn type_arguments(text: &str) -> Vec<String> {
    let Some(open) = text.find('<') else {
        return Vec::new();
    };
    let Some(close) = text.rfind('>') else {
        return Vec::new();
    };
    if close <= open {
        return Vec::new();
    }
    text[open + 1..close]
        .split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$' || c == '.'))
        .filter(|word| !word.is_empty() && !matches!(*word, "extends" | "super"))
        .map(str::to_string)
        .collect()
}

/// Arguments of the call whose `(` is at `open`; `None` when the parenthesis is unclosed.
fn count_arguments(tokens: &[Token<'_>], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut commas = 0usize;
    let mut empty = true;
    for token in &tokens[open..] {
        match token.kind {
            TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket => depth += 1,
            TokenKind::RParen | TokenKind::RBrace | TokenKind::RBracket => {
                depth -= 1;
                if depth == 0 {
                    return Some(if empty { 0 } else { commas + 1 });
                }
            }
            TokenKind::Comma if depth == 1 => commas += 1,
            _ => {}
        }
        if depth >= 1 && !token.is(TokenKind::LParen) || depth > 1 {
            empty = false;
        }
    }
    None
}

/// Prefer the overload whose parameter count matches the call.
fn pick_overload(candidates: Vec<Arc<DefinitionEntry>>, arity: Option<usize>) -> Option<Arc<DefinitionEntry>> {
    if let Some(arity) = arity {
        if let Some(exact) = candidates
            .iter()
            .find(|c| c.kind() == ElementKind::Method && c.element.extra.parameters.len() == arity)
        {
            return Some(exact.clone());
        }
    }
    candidates.into_iter().next()
}

fn is_assignment(previous: Option<Token<'_>>, next: Option<Token<'_>>) -> bool {
    next.is_some_and(|n| {
        matches!(
            n.kind,
            TokenKind::Eq | TokenKind::CompoundAssign | TokenKind::PlusPlus | TokenKind::MinusMinus
        )
    }) || previous.is_some_and(|p| matches!(p.kind, TokenKind::PlusPlus | TokenKind::MinusMinus))
}

fn access_kind(is_call: bool, previous: Option<Token<'_>>, next: Option<Token<'_>>) -> DependencyType {
    if is_call {
        DependencyType::Call
    } else if is_assignment(previous, next) {
        DependencyType::Assign
    } else {
        DependencyType::Use
    }
}

fn member_kind(is_call: bool) -> ElementKind {
    if is_call { ElementKind::Method } else { ElementKind::Field }
}

fn starts_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::Collector;
    use crate::lang::java::{JavaCollector, JavaSymbolResolver};

    fn analyze(files: &[(&str, &str)]) -> Vec<DependencyRelation> {
        let global = GlobalContext::new(Arc::new(JavaSymbolResolver::new()));
        let registered: Vec<_> = files
            .iter()
            .map(|(path, text)| {
                let fc = JavaCollector::new().collect(path, Arc::from(*text)).unwrap();
                global.register_file_context(fc)
            })
            .collect();
        registered
            .iter()
            .flat_map(|fc| JavaExtractor::new().extract(fc, &global).unwrap())
            .collect()
    }

    fn has(relations: &[DependencyRelation], kind: DependencyType, source: &str, target: &str) -> bool {
        relations
            .iter()
            .any(|r| r.kind == kind && r.source.qualified_name == source && r.target.qualified_name == target)
    }

    #[test]
    fn test_type_arguments() {
        assert_eq!(type_arguments("Map<String, List<Foo>>"), vec!["String", "List", "Foo"]);
        assert_eq!(type_arguments("List<? extends a.Bar>"), vec!["a.Bar"]);
        assert!(type_arguments("Plain").is_empty());
    }

    #[test]
    fn test_count_arguments() {
        let tokens = tokenize("f(a, g(b, c), new int[]{1, 2})");
        assert_eq!(count_arguments(&tokens, 1), Some(3));
        let tokens = tokenize("f()");
        assert_eq!(count_arguments(&tokens, 1), Some(0));
    }

    #[test]
    fn test_inherited_field_use() {
        let relations = analyze(&[
            ("Base.java", "class Base { int field; }"),
            ("Derived.java", "class Derived extends Base { void m() { int y = field; } }"),
        ]);
        assert!(has(&relations, DependencyType::Extend, "Derived", "Base"));
        assert!(has(&relations, DependencyType::Use, "Derived.m()", "Base.field"));
    }

    #[test]
    fn test_declaration_relations() {
        let relations = analyze(&[(
            "p/Svc.java",
            "package p;\n\
             import java.util.List;\n\
             interface Api { void go(); }\n\
             class Err extends Exception { }\n\
             class Svc implements Api {\n\
               @Override public void go() { }\n\
               List<Api> all(Api seed) throws Err { return null; }\n\
             }\n",
        )]);
        assert!(has(&relations, DependencyType::Implement, "p.Svc", "p.Api"));
        assert!(has(&relations, DependencyType::Extend, "p.Err", "java.lang.Exception"));
        assert!(has(&relations, DependencyType::Annotation, "p.Svc.go()", "java.lang.Override"));
        assert!(has(&relations, DependencyType::Override, "p.Svc.go()", "p.Api.go()"));
        assert!(has(&relations, DependencyType::Return, "p.Svc.all(Api)", "java.util.List"));
        assert!(has(&relations, DependencyType::TypeArg, "p.Svc.all(Api)", "p.Api"));
        assert!(has(&relations, DependencyType::Parameter, "p.Svc.all(Api)", "p.Api"));
        assert!(has(&relations, DependencyType::Throw, "p.Svc.all(Api)", "p.Err"));
        assert!(has(&relations, DependencyType::Contain, "p.Svc", "p.Svc.go()"));
        assert!(has(&relations, DependencyType::Import, "p/Svc.java", "java.util.List"));

        let import = relations.iter().find(|r| r.kind == DependencyType::Import).unwrap();
        assert!(import.target.is_from_external);
    }

    #[test]
    fn test_body_relations() {
        let relations = analyze(&[
            (
                "Repo.java",
                "class Repo { static Repo INSTANCE; int size; void save(Object o) { } void save(Object o, int n) { } }",
            ),
            (
                "App.java",
                "class App {\n\
                   Repo repo = new Repo();\n\
                   int count;\n\
                   void run(Object o) {\n\
                     Repo r = (Repo) o;\n\
                     r.save(o, 1);\n\
                     helper();\n\
                     count = repo.size;\n\
                     count++;\n\
                     this.count += 1;\n\
                     Repo.INSTANCE.save(o);\n\
                   }\n\
                   void helper() { }\n\
                 }\n",
            ),
        ]);
        assert!(has(&relations, DependencyType::Create, "App", "Repo"));
        assert!(has(&relations, DependencyType::Cast, "App.run(Object)", "Repo"));
        assert!(has(&relations, DependencyType::Call, "App.run(Object)", "Repo.save(Object,int)"));
        assert!(has(&relations, DependencyType::Call, "App.run(Object)", "App.helper()"));
        assert!(has(&relations, DependencyType::Use, "App.run(Object)", "Repo.size"));
        assert!(has(&relations, DependencyType::Use, "App.run(Object)", "App.repo"));
        assert!(has(&relations, DependencyType::Assign, "App.run(Object)", "App.count"));
        assert!(has(&relations, DependencyType::Use, "App.run(Object)", "Repo.INSTANCE"));
    }

    fn targets_from<'r>(relations: &'r [DependencyRelation], source: &str) -> Vec<&'r str> {
        relations
            .iter()
            .filter(|r| r.kind != DependencyType::Contain && r.source.qualified_name == source)
            .map(|r| r.target.qualified_name.as_str())
            .collect()
    }

    #[test]
    fn test_bare_name_does_not_bind_another_methods_local() {
        let relations = analyze(&[("A.java", "class A { void a() { int tmp = 0; } void b() { tmp = 1; } }")]);
        assert!(!targets_from(&relations, "A.b()").contains(&"A.a().tmp"));
        let assign = relations
            .iter()
            .find(|r| r.kind == DependencyType::Assign && r.source.qualified_name == "A.b()")
            .unwrap();
        assert_eq!(assign.target.qualified_name, "tmp");
        assert!(assign.target.is_from_external);
    }

    #[test]
    fn test_static_context_never_binds_instance_field() {
        let relations = analyze(&[(
            "A.java",
            "class A {\n\
               int n;\n\
               static int total;\n\
               static void s() { n = 1; total = 2; }\n\
               static void t() { Runnable r = () -> { n = 3; }; }\n\
             }\n",
        )]);
        assert!(!targets_from(&relations, "A.s()").contains(&"A.n"));
        assert!(has(&relations, DependencyType::Assign, "A.s()", "A.total"));
        assert!(!targets_from(&relations, "A.t().lambda$1").contains(&"A.n"));
        assert!(has(&relations, DependencyType::Assign, "A.t().lambda$1", "n"));
    }

    #[test]
    fn test_static_wildcard_import_call() {
        let relations = analyze(&[
            ("u/Util.java", "package u; public class Util { public static int max(int a, int b) { return a; } }"),
            ("M.java", "import static u.Util.*;\nclass M { int m() { return max(1, 2); } }"),
        ]);
        assert!(has(&relations, DependencyType::Call, "M.m()", "u.Util.max(int,int)"));
    }

    #[test]
    fn test_lambda_and_anonymous_class_are_sources() {
        let relations = analyze(&[(
            "Worker.java",
            "import java.util.List;\n\
             interface Task { void run(); }\n\
             class Worker {\n\
               int done;\n\
               void go(List<String> xs) {\n\
                 xs.forEach(x -> finish());\n\
                 Task t = new Task() {\n\
                   public void run() { done++; }\n\
                 };\n\
               }\n\
               void finish() { }\n\
             }\n",
        )]);
        assert!(has(&relations, DependencyType::Call, "Worker.go(List).lambda$1", "Worker.finish()"));
        assert!(has(&relations, DependencyType::Create, "Worker.go(List)", "Task"));
        assert!(has(&relations, DependencyType::Implement, "Worker.go(List).anonymous$1", "Task"));
        assert!(has(&relations, DependencyType::Assign, "Worker.go(List).anonymous$1.run()", "Worker.done"));
        assert!(has(&relations, DependencyType::Override, "Worker.go(List).anonymous$1.run()", "Task.run()"));
        assert!(has(&relations, DependencyType::Contain, "Worker.go(List)", "Worker.go(List).lambda$1"));
    }

    #[test]
    fn test_unresolved_call_becomes_external() {
        let relations = analyze(&[(
            "A.java",
            "import java.util.List;\nclass A { void m(List<String> xs) { xs.add(\"x\"); System.out.println(xs); } }",
        )]);
        let add = relations
            .iter()
            .find(|r| r.kind == DependencyType::Call && r.target.name == "add")
            .unwrap();
        assert_eq!(add.target.qualified_name, "java.util.List.add");
        assert!(add.target.is_from_external);
        assert!(has(&relations, DependencyType::Use, "A.m(List)", "java.lang.System.out"));
        assert!(relations.iter().all(|r| r.source.qualified_name != "A.java" || r.kind == DependencyType::Import));
    }
}
