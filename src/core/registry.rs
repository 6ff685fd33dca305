//! Executor Registry - maps block type names to executor factories
//!
//! Built-in executors are registered up front. Composite block types are
//! expanded and registered lazily the first time a block of that type is
//! created; the expanded chain is cached so later blocks of the same type
//! reuse it. Re-registering a name overwrites the previous factory.
//!
//! The registry is an explicit object owned by the engine. It is cheap to
//! clone and clones share their tables.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::block::{BlockDefinition, BlockExecutor, BlockTypeRef};
use super::result::{ExecutionError, ExecutionResult};
use crate::categories::BlockCategory;
use crate::runtime::composite::{self, CompositeBlockExecutor, CompositeBlockType, CompositeChain};
use crate::runtime::config::DEFAULT_MAX_EXPANSION_DEPTH;

const TRACING_TARGET: &str = "block_pipeline::core::registry";

/// Creates an executor for a block definition
pub type ExecutorFactory = Arc<dyn Fn(BlockDefinition) -> Box<dyn BlockExecutor> + Send + Sync>;

/// Statically known executor type
pub trait ExecutorType: BlockExecutor + Sized + 'static {
    /// Block type name the executor is registered under
    const TYPE: &'static str;

    const CATEGORY: BlockCategory;

    fn from_definition(block: BlockDefinition) -> Self;
}

#[derive(Clone)]
struct RegisteredExecutor {
    factory: ExecutorFactory,
    category: BlockCategory,
}

/// Registry of executor factories
#[derive(Clone)]
pub struct ExecutorRegistry {
    factories: Arc<RwLock<HashMap<String, RegisteredExecutor>>>,
    composites: Arc<RwLock<HashMap<String, Arc<CompositeChain>>>>,
    max_expansion_depth: usize,
}

impl ExecutorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factories: Arc::new(RwLock::new(HashMap::new())),
            composites: Arc::new(RwLock::new(HashMap::new())),
            max_expansion_depth: DEFAULT_MAX_EXPANSION_DEPTH,
        }
    }

    /// Create a registry with every built-in executor registered
    ///
    /// # Example
    /// ```
    /// use block_pipeline::core::registry::ExecutorRegistry;
    ///
    /// let registry = ExecutorRegistry::with_builtins();
    /// assert!(registry.contains("LayoutValidator"));
    /// ```
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        crate::categories::register_builtin_executors(&registry);
        registry
    }

    pub fn with_max_expansion_depth(mut self, depth: usize) -> Self {
        self.max_expansion_depth = depth;
        self
    }

    /// Register a factory under a type name, replacing any previous one
    pub fn register(&self, type_name: impl Into<String>, category: BlockCategory, factory: ExecutorFactory) {
        let type_name = type_name.into();
        tracing::debug!(target: TRACING_TARGET, block_type = %type_name, %category, "registering executor");
        self.factories
            .write()
            .insert(type_name, RegisteredExecutor { factory, category });
    }

    /// Register a statically known executor type
    pub fn register_type<E: ExecutorType>(&self) {
        let factory: ExecutorFactory =
            Arc::new(|block: BlockDefinition| -> Box<dyn BlockExecutor> {
                Box::new(E::from_definition(block))
            });
        self.register(E::TYPE, E::CATEGORY, factory);
    }

    /// Expand a composite block type and register it under its name.
    ///
    /// Registering the same composite again replaces the factory with an
    /// equivalent one.
    pub fn register_composite(&self, composite: &CompositeBlockType) -> ExecutionResult<Arc<CompositeChain>> {
        self.register_composite_in(composite, &mut Vec::new())
    }

    fn register_composite_in(
        &self,
        composite: &CompositeBlockType,
        stack: &mut Vec<String>,
    ) -> ExecutionResult<Arc<CompositeChain>> {
        if let Some(position) = stack.iter().position(|name| *name == composite.name) {
            let mut cycle: Vec<&str> = stack[position..].iter().map(String::as_str).collect();
            cycle.push(&composite.name);
            return Err(ExecutionError::expansion(format!(
                "Composite block type `{}` references itself: {}",
                composite.name,
                cycle.join(" -> ")
            ))
            .with_hint("Composite block types cannot contain blocks of their own type")
            .with_location(composite.location.clone()));
        }
        if stack.len() >= self.max_expansion_depth {
            return Err(ExecutionError::expansion(format!(
                "Composite block type `{}` exceeds the maximum nesting depth of {}",
                composite.name, self.max_expansion_depth
            ))
            .with_location(composite.location.clone()));
        }

        stack.push(composite.name.clone());
        let expanded = composite::expand(composite, self, stack);
        stack.pop();
        let chain = Arc::new(expanded?);

        let factory_chain = Arc::clone(&chain);
        let factory: ExecutorFactory =
            Arc::new(move |block: BlockDefinition| -> Box<dyn BlockExecutor> {
                Box::new(CompositeBlockExecutor::new(block, Arc::clone(&factory_chain)))
            });
        self.register(composite.name.clone(), BlockCategory::Composite, factory);
        self.composites
            .write()
            .insert(composite.name.clone(), Arc::clone(&chain));
        Ok(chain)
    }

    /// Whether a factory is registered under the name
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.read().contains_key(type_name)
    }

    pub fn count(&self) -> usize {
        self.factories.read().len()
    }

    /// Registered type names, sorted
    pub fn type_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.factories.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Registered type names of one category, sorted
    pub fn type_names_in(&self, category: BlockCategory) -> Vec<String> {
        let mut names: Vec<String> = self
            .factories
            .read()
            .iter()
            .filter(|(_, registered)| registered.category == category)
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Cached expansion of a composite block type
    pub fn composite_chain(&self, type_name: &str) -> Option<Arc<CompositeChain>> {
        self.composites.read().get(type_name).cloned()
    }

    /// Create the executor for a block.
    ///
    /// Composite types are expanded and registered on first use, unless a
    /// factory is already registered under the name. Expansion failures are
    /// returned as errors.
    ///
    /// # Panics
    ///
    /// Panics if the block has no type reference, or if its type is built-in
    /// but no executor was registered for it. Both are broken invariants of
    /// the caller, not user errors.
    pub fn create(&self, block: &BlockDefinition) -> ExecutionResult<Box<dyn BlockExecutor>> {
        self.create_in(block, &mut Vec::new())
    }

    pub(crate) fn create_in(
        &self,
        block: &BlockDefinition,
        stack: &mut Vec<String>,
    ) -> ExecutionResult<Box<dyn BlockExecutor>> {
        let block_type = match &block.block_type {
            Some(block_type) => block_type,
            None => panic!(
                "Block `{}` has no block type; references must be resolved before execution",
                block.name
            ),
        };

        if let BlockTypeRef::Composite(composite) = block_type {
            let registered = self.factories.read().contains_key(&composite.name);
            let in_progress = stack.contains(&composite.name);
            if !registered || in_progress {
                self.register_composite_in(composite, stack)
                    .map_err(|e| e.or_location(block.location()))?;
            }
        }

        let factory = match self.factories.read().get(block_type.name()) {
            Some(registered) => Arc::clone(&registered.factory),
            None => panic!(
                "No executor was registered for block type {}",
                block_type.name()
            ),
        };
        Ok(factory(block.clone()))
    }
}

impl Default for ExecutorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ExecutorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutorRegistry")
            .field("types", &self.type_names())
            .field("max_expansion_depth", &self.max_expansion_depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io_type::IoType;
    use crate::core::result::ErrorKind;
    use crate::runtime::composite::CompositePort;
    use crate::tests::test_blocks::{register_test_blocks, StaticSheetSource};

    fn registry() -> ExecutorRegistry {
        let registry = ExecutorRegistry::with_builtins();
        register_test_blocks(&registry);
        registry
    }

    fn sheet_loader() -> CompositeBlockType {
        CompositeBlockType::chain(
            "SheetLoader",
            CompositePort::new("in", IoType::None),
            CompositePort::new("out", IoType::Sheet),
            vec![
                BlockDefinition::builtin("source", StaticSheetSource::TYPE),
                BlockDefinition::builtin("dropHeader", "RowDeleter")
                    .with_property("delete", vec![1i64]),
            ],
        )
    }

    #[test]
    fn test_builtins_are_registered() {
        let registry = ExecutorRegistry::with_builtins();
        for name in [
            "LocalFileExtractor",
            "FilePicker",
            "SheetPicker",
            "RowDeleter",
            "ColumnDeleter",
            "LayoutValidator",
            "TableLogger",
        ] {
            assert!(registry.contains(name), "{} should be registered", name);
        }
        assert_eq!(
            registry.type_names_in(BlockCategory::Validation),
            vec!["LayoutValidator".to_string()]
        );
    }

    #[test]
    fn test_create_builtin_executor() {
        let registry = registry();
        let block = BlockDefinition::builtin("validator", "LayoutValidator");
        let executor = registry.create(&block).unwrap();

        assert_eq!(executor.block_type(), "LayoutValidator");
        assert_eq!(executor.block().name, "validator");
        assert_eq!(executor.input_type(), IoType::Sheet);
        assert_eq!(executor.output_type(), IoType::Table);
    }

    #[test]
    fn test_reregistration_overwrites() {
        let registry = registry();
        let before = registry.count();
        registry.register_type::<StaticSheetSource>();
        assert_eq!(registry.count(), before);
    }

    #[test]
    fn test_composite_is_registered_lazily() {
        let registry = registry();
        let composite = sheet_loader().into_shared();
        assert!(!registry.contains("SheetLoader"));

        let block = BlockDefinition::composite("loader", Arc::clone(&composite));
        let executor = registry.create(&block).unwrap();

        assert!(registry.contains("SheetLoader"));
        assert_eq!(executor.block_type(), "SheetLoader");
        assert_eq!(executor.input_type(), IoType::None);
        assert_eq!(executor.output_type(), IoType::Sheet);
        assert_eq!(registry.composite_chain("SheetLoader").unwrap().len(), 2);
        assert_eq!(registry.type_names_in(BlockCategory::Composite), vec!["SheetLoader"]);
    }

    #[test]
    fn test_composite_does_not_replace_registered_type() {
        let registry = registry();
        let shadow = CompositeBlockType::chain(
            "RowDeleter",
            CompositePort::new("in", IoType::None),
            CompositePort::new("out", IoType::Sheet),
            vec![BlockDefinition::builtin("source", StaticSheetSource::TYPE)],
        )
        .into_shared();

        registry
            .create(&BlockDefinition::composite("shadow", shadow))
            .unwrap();
        assert!(registry.composite_chain("RowDeleter").is_none());

        let executor = registry
            .create(&BlockDefinition::builtin("drop", "RowDeleter"))
            .unwrap();
        assert_eq!(executor.input_type(), IoType::Sheet);
        assert_eq!(executor.output_type(), IoType::Sheet);
        assert_eq!(registry.type_names_in(BlockCategory::Composite), Vec::<String>::new());
    }

    #[test]
    fn test_composite_registration_is_idempotent() {
        let registry = registry();
        let composite = sheet_loader();

        let first = registry.register_composite(&composite).unwrap();
        let second = registry.register_composite(&composite).unwrap();

        assert_eq!(first.input_type, second.input_type);
        assert_eq!(first.output_type, second.output_type);
        assert_eq!(first.len(), second.len());
    }

    #[test]
    fn test_mismatched_chain_is_rejected() {
        let registry = registry();
        let composite = CompositeBlockType::chain(
            "Broken",
            CompositePort::untyped("in"),
            CompositePort::untyped("out"),
            vec![
                BlockDefinition::builtin("source", StaticSheetSource::TYPE),
                BlockDefinition::builtin("picker", "SheetPicker"),
            ],
        );
        let err = registry.register_composite(&composite).unwrap_err();
        assert_eq!(err.kind, ErrorKind::TypeMismatch);
        assert!(!registry.contains("Broken"));
    }

    #[test]
    fn test_declared_port_type_must_match_chain() {
        let registry = registry();
        let mut composite = sheet_loader();
        composite.output = CompositePort::new("out", IoType::Table);

        let err = registry.register_composite(&composite).unwrap_err();
        assert!(err.message.contains("declared as Table"));
    }

    #[test]
    fn test_self_referencing_composite_is_rejected() {
        let registry = registry();
        let inner = CompositeBlockType::chain(
            "Recursive",
            CompositePort::untyped("in"),
            CompositePort::untyped("out"),
            vec![BlockDefinition::builtin("source", StaticSheetSource::TYPE)],
        );
        let outer = CompositeBlockType::chain(
            "Recursive",
            CompositePort::untyped("in"),
            CompositePort::untyped("out"),
            vec![
                BlockDefinition::builtin("source", StaticSheetSource::TYPE),
                BlockDefinition::composite("again", Arc::new(inner)),
            ],
        );

        let err = registry.register_composite(&outer).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Expansion);
        assert!(err.message.contains("Recursive -> Recursive"));
    }

    #[test]
    fn test_expansion_depth_is_bounded() {
        let registry = registry().with_max_expansion_depth(2);
        let mut current = CompositeBlockType::chain(
            "Level0",
            CompositePort::untyped("in"),
            CompositePort::untyped("out"),
            vec![BlockDefinition::builtin("source", StaticSheetSource::TYPE)],
        );
        for level in 1..4 {
            current = CompositeBlockType::chain(
                format!("Level{}", level),
                CompositePort::untyped("in"),
                CompositePort::untyped("out"),
                vec![BlockDefinition::composite("inner", Arc::new(current))],
            );
        }

        let err = registry.register_composite(&current).unwrap_err();
        assert!(err.message.contains("maximum nesting depth of 2"));
    }

    #[test]
    fn test_unknown_type_inside_composite_is_an_error() {
        let registry = registry();
        let composite = CompositeBlockType::chain(
            "Unknown",
            CompositePort::untyped("in"),
            CompositePort::untyped("out"),
            vec![BlockDefinition::builtin("csv", "CsvInterpreter")],
        );

        let err = registry.register_composite(&composite).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Expansion);
        assert!(err.message.contains("unknown block type `CsvInterpreter`"));
        assert_eq!(err.location.unwrap().block.as_deref(), Some("csv"));
    }

    #[test]
    #[should_panic(expected = "No executor was registered for block type Missing")]
    fn test_unregistered_builtin_panics() {
        let registry = ExecutorRegistry::new();
        let _ = registry.create(&BlockDefinition::builtin("b", "Missing"));
    }

    #[test]
    #[should_panic(expected = "has no block type")]
    fn test_missing_type_reference_panics() {
        let registry = ExecutorRegistry::new();
        let _ = registry.create(&BlockDefinition::new("b", None));
    }

    #[test]
    fn test_concurrent_composite_registration() {
        let registry = registry();
        let composite = Arc::new(sheet_loader());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                let composite = Arc::clone(&composite);
                std::thread::spawn(move || {
                    let block = BlockDefinition::composite(format!("loader{}", i), composite);
                    registry.create(&block).map(|e| e.output_type())
                })
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap().unwrap(), IoType::Sheet);
        }
        assert_eq!(registry.composite_chain("SheetLoader").unwrap().len(), 2);
    }
}
