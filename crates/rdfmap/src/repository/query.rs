//! Query Pattern Generator: CONSTRUCT queries derived from class descriptors.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use crate::analysis::{ClassAnalyzer, ClassDescriptor, ElementKind, Mapped, MappedType, TypeKey};
use crate::error::AnalysisError;

/// Variable bound to the root subject.
pub const VAR_SUBJECT: &str = "s";
/// Prefix of the object variables, numbered from 1.
pub const VAR_OBJECT: &str = "o";
pub const INDENT: &str = "  ";

/// Generates and caches the query text for each mapped type.
///
/// The query does not depend on a subject; callers bind `?s` when executing.
pub struct QueryGenerator {
    analyzer: Arc<ClassAnalyzer>,
    cache: RwLock<HashMap<TypeKey, Arc<str>>>,
}

impl QueryGenerator {
    pub fn new(analyzer: Arc<ClassAnalyzer>) -> Self {
        Self {
            analyzer,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn generate<T: Mapped>(&self) -> Result<Arc<str>, AnalysisError> {
        self.generate_type(MappedType::of::<T>())
    }

    pub fn generate_type(&self, mapped: MappedType) -> Result<Arc<str>, AnalysisError> {
        let key = mapped.key();
        if let Some(query) = self.cache.read().get(&key) {
            debug!(ty = %key, "query cache hit");
            return Ok(query.clone());
        }

        let descriptor = self.analyzer.analyze_type(mapped)?;
        let subject = format!("?{VAR_SUBJECT}");
        let construct = self.pattern(&subject, &descriptor, &mut 1, false, &mut Vec::new())?;
        let filter = self.pattern(&subject, &descriptor, &mut 1, true, &mut Vec::new())?;
        let query: Arc<str> = format!("CONSTRUCT {{\n{construct}\n}} WHERE {{\n{filter}\n}}\n").into();
        debug!(ty = %key, "generated query");

        Ok(self.cache.write().entry(key).or_insert(query).clone())
    }

    /// One pattern per predicate, joined by ` .\n`. Object variables are
    /// numbered across the whole walk so nested blocks never reuse one.
    fn pattern(
        &self,
        subject: &str,
        descriptor: &ClassDescriptor,
        counter: &mut usize,
        optional_groups: bool,
        stack: &mut Vec<TypeKey>,
    ) -> Result<String, AnalysisError> {
        stack.push(descriptor.key());
        let mut patterns = Vec::with_capacity(descriptor.predicates().len());

        for predicate in descriptor.predicates() {
            let spec = predicate.annotation();
            let optional = optional_groups && !spec.is_required();
            let object = format!("?{VAR_OBJECT}{counter}");
            *counter += 1;

            let mut pattern = String::from(INDENT);
            if optional {
                pattern.push_str("OPTIONAL { ");
            }
            pattern.push_str(&format!("{subject} <{}> {object}", spec.iri()));

            let nested = predicate
                .binding()
                .map(|binding| binding.property_type().element())
                .filter(|_| predicate.is_nested());
            if let Some(ElementKind::Mapped(mapped)) = nested {
                if !stack.contains(&mapped.key()) {
                    let child = self.analyzer.analyze_type(mapped)?;
                    pattern.push_str(" .\n");
                    pattern.push_str(&self.pattern(&object, &child, counter, optional_groups, stack)?);
                }
            }

            if optional {
                pattern.push_str(" }");
            }
            patterns.push(pattern);
        }

        stack.pop();
        Ok(patterns.join(" .\n"))
    }
}
