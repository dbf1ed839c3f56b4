//! Mapper facade
//!
//! The [`Mapper`] owns the shared configuration storage, the convention
//! mapper, the plan cache and the collaborators. It is cheap to clone and
//! safe to share between threads.
//!
//! ```
//! use objmap_core::{Mapper, Object, Value};
//! use objmap_schema::{TypeDescriptor, TypeRegistry};
//! use std::sync::Arc;
//!
//! let types = TypeRegistry::new();
//! types.register(TypeDescriptor::new("UserRecord").with_properties(["user_id", "first_name"]));
//! types.register(TypeDescriptor::new("UserDto").with_properties(["userId", "firstName"]));
//!
//! let mapper = Mapper::builder().introspector(Arc::new(types)).build();
//! let source = Value::Object(Object::typed("UserRecord").with("user_id", 1).with("first_name", "John"));
//! let dto = mapper.map(&source, "UserDto").unwrap();
//! assert_eq!(dto.get_path("firstName"), Some(&Value::from("John")));
//! ```

use crate::cache::{CachePolicy, MappingCache};
use crate::collection::CollectionTransformer;
use crate::condition::Condition;
use crate::config::MapperConfig;
use crate::convention_mapper::{ConventionMapper, DiscoveredMatch};
use crate::conventions::NamingConvention;
use crate::factory::{ObjectFactory, RecordFactory};
use crate::introspect::{ARRAY_TYPE, SourceView, TypeIntrospector, is_generic_map};
use crate::plan::{PlanMember, PlanOrigin, ResolvedPlan};
use crate::profile::MappingProfile;
use crate::property_mapping::PropertyMapping;
use crate::storage::{MappingStorage, PairKey};
use crate::transformer::{Transform, Transformer, TransformerRegistry};
use crate::type_mapping::TypeMapping;
use crate::{ConfigurationIssue, Error, Result};
use objmap_schema::TypeRegistry;
use objmap_value::Value;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, trace};

pub(crate) struct MapperInner {
    storage: MappingStorage,
    introspector: Arc<dyn TypeIntrospector>,
    factory: Arc<dyn ObjectFactory>,
    conventions: RwLock<ConventionMapper>,
    use_conventions: AtomicBool,
    cache: MappingCache,
    transformers: TransformerRegistry,
    profiles: Mutex<HashSet<String>>,
}

/// Object mapper
#[derive(Clone)]
pub struct Mapper {
    inner: Arc<MapperInner>,
}

/// Builder for [`Mapper`]
#[derive(Default)]
pub struct MapperBuilder {
    introspector: Option<Arc<dyn TypeIntrospector>>,
    factory: Option<Arc<dyn ObjectFactory>>,
    transformers: Option<TransformerRegistry>,
    conventions: Vec<Arc<dyn NamingConvention>>,
    config: MapperConfig,
}

impl MapperBuilder {
    /// Type information source (default: an empty [`TypeRegistry`])
    #[must_use]
    pub fn introspector(mut self, introspector: Arc<dyn TypeIntrospector>) -> Self {
        self.introspector = Some(introspector);
        self
    }

    /// Destination constructor (default: [`RecordFactory`])
    #[must_use]
    pub fn factory(mut self, factory: Arc<dyn ObjectFactory>) -> Self {
        self.factory = Some(factory);
        self
    }

    /// Named transformers (default: the built-ins)
    #[must_use]
    pub fn transformers(mut self, transformers: TransformerRegistry) -> Self {
        self.transformers = Some(transformers);
        self
    }

    /// Extra naming convention, tried after the built-ins
    #[must_use]
    pub fn convention(mut self, convention: Arc<dyn NamingConvention>) -> Self {
        self.conventions.push(convention);
        self
    }

    #[must_use]
    pub fn config(mut self, config: MapperConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn use_conventions(mut self, enabled: bool) -> Self {
        self.config.use_conventions = enabled;
        self
    }

    #[must_use]
    pub fn confidence_threshold(mut self, threshold: f64) -> Self {
        self.config.confidence_threshold = threshold;
        self
    }

    #[must_use]
    pub fn cache(mut self, policy: CachePolicy) -> Self {
        self.config.cache = policy;
        self
    }

    #[must_use]
    pub fn build(self) -> Mapper {
        let introspector = self
            .introspector
            .unwrap_or_else(|| Arc::new(TypeRegistry::new()) as Arc<dyn TypeIntrospector>);

        let mut conventions = ConventionMapper::new(Arc::clone(&introspector));
        conventions.set_confidence_threshold(self.config.confidence_threshold);
        for convention in self.conventions {
            conventions.register_convention(convention);
        }

        debug!(
            "Building mapper (conventions: {}, threshold: {:.2}, cache: {:?})",
            self.config.use_conventions,
            conventions.threshold(),
            self.config.cache
        );

        Mapper {
            inner: Arc::new(MapperInner {
                storage: MappingStorage::new(),
                introspector,
                factory: self
                    .factory
                    .unwrap_or_else(|| Arc::new(RecordFactory) as Arc<dyn ObjectFactory>),
                conventions: RwLock::new(conventions),
                use_conventions: AtomicBool::new(self.config.use_conventions),
                cache: MappingCache::new(self.config.cache),
                transformers: self
                    .transformers
                    .unwrap_or_else(TransformerRegistry::with_builtins),
                profiles: Mutex::new(HashSet::new()),
            }),
        }
    }
}

/// Two type mappings configured as mirror images of each other
#[derive(Debug, Clone)]
pub struct BidirectionalMapping {
    forward: TypeMapping,
    reverse: TypeMapping,
}

impl BidirectionalMapping {
    /// The `a -> b` mapping
    #[must_use]
    pub fn forward(&self) -> &TypeMapping {
        &self.forward
    }

    /// The `b -> a` mapping
    #[must_use]
    pub fn reverse(&self) -> &TypeMapping {
        &self.reverse
    }

    /// Pair member `a_member` of type `a` with `b_member` of type `b` in
    /// both directions
    ///
    /// # Errors
    ///
    /// Returns [`Error::Sealed`] if either direction is sealed.
    pub fn for_members(&self, a_member: &str, b_member: &str) -> Result<&Self> {
        self.forward.for_member(b_member, |m| {
            m.map_from(a_member);
        })?;
        self.reverse.for_member(a_member, |m| {
            m.map_from(b_member);
        })?;
        Ok(self)
    }

    /// Seal both directions
    ///
    /// # Errors
    ///
    /// Returns the first configuration error.
    pub fn seal(&self) -> Result<()> {
        self.forward.seal()?;
        self.reverse.seal()
    }
}

impl Mapper {
    /// Mapper with default collaborators and configuration
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    #[must_use]
    pub fn builder() -> MapperBuilder {
        MapperBuilder::default()
    }

    pub(crate) fn from_inner(inner: Arc<MapperInner>) -> Self {
        Self { inner }
    }

    pub(crate) fn inner(&self) -> &Arc<MapperInner> {
        &self.inner
    }

    #[must_use]
    pub fn introspector(&self) -> &Arc<dyn TypeIntrospector> {
        &self.inner.introspector
    }

    #[must_use]
    pub fn storage(&self) -> &MappingStorage {
        &self.inner.storage
    }

    #[must_use]
    pub fn cache(&self) -> &MappingCache {
        &self.inner.cache
    }

    #[must_use]
    pub fn transformers(&self) -> &TransformerRegistry {
        &self.inner.transformers
    }

    fn conventions(&self) -> RwLockReadGuard<'_, ConventionMapper> {
        // convention state is plain data, a panic elsewhere cannot leave it torn
        self.inner
            .conventions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn conventions_mut(&self) -> RwLockWriteGuard<'_, ConventionMapper> {
        self.inner
            .conventions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn type_mapping_for(&self, key: PairKey) -> TypeMapping {
        TypeMapping::new(
            key,
            self.inner.storage.clone(),
            Arc::clone(&self.inner.introspector),
            self.inner.transformers.clone(),
        )
    }

    // ---- configuration ----

    /// Configuration handle for `source -> destination`. Repeated calls
    /// return handles on the same shared configuration.
    #[must_use]
    pub fn create_map(&self, source_type: &str, destination_type: &str) -> TypeMapping {
        debug!("Creating map {} -> {}", source_type, destination_type);
        self.type_mapping_for(PairKey::new(source_type, destination_type))
    }

    /// Existing configuration for a pair, if any
    #[must_use]
    pub fn type_mapping(&self, source_type: &str, destination_type: &str) -> Option<TypeMapping> {
        let key = PairKey::new(source_type, destination_type);
        self.inner
            .storage
            .contains(&key)
            .then(|| self.type_mapping_for(key))
    }

    /// Create `destination -> source`, inverting every plain `map_from`
    /// member already configured on `source -> destination`
    ///
    /// # Errors
    ///
    /// Returns an error if the reverse mapping is already sealed.
    pub fn create_reverse_map(
        &self,
        source_type: &str,
        destination_type: &str,
    ) -> Result<TypeMapping> {
        let reverse = self.create_map(destination_type, source_type);
        if let Some(forward) = self.type_mapping(source_type, destination_type) {
            for (destination, source) in forward.plain_links()? {
                if reverse.has_member(&source)? {
                    continue;
                }
                reverse.for_member(&source, |m| {
                    m.map_from(destination);
                })?;
            }
        }
        Ok(reverse)
    }

    /// Create `a -> b` and `b -> a` together
    #[must_use]
    pub fn create_map_bidirectional(&self, a: &str, b: &str) -> BidirectionalMapping {
        BidirectionalMapping {
            forward: self.create_map(a, b),
            reverse: self.create_map(b, a),
        }
    }

    /// Seal every configured type mapping. Returns the number sealed.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error.
    pub fn seal_all(&self) -> Result<usize> {
        let pairs = self.inner.storage.pairs();
        for key in &pairs {
            self.type_mapping_for(key.clone()).seal()?;
        }
        Ok(pairs.len())
    }

    /// Run a profile's configuration once. Returns false when a profile
    /// with the same name was already added.
    ///
    /// # Errors
    ///
    /// Returns the profile's configuration error; the profile can then be
    /// added again.
    pub fn add_profile(&self, profile: &dyn MappingProfile) -> Result<bool> {
        let name = profile.name().to_string();
        {
            let mut profiles = self
                .inner
                .profiles
                .lock()
                .map_err(|_| Error::Mapping("Failed to lock profile registry".to_string()))?;
            if !profiles.insert(name.clone()) {
                debug!("Profile {} already added", name);
                return Ok(false);
            }
        }

        if let Err(e) = profile.configure(self) {
            if let Ok(mut profiles) = self.inner.profiles.lock() {
                profiles.remove(&name);
            }
            return Err(e);
        }
        info!("Added mapping profile {}", name);
        Ok(true)
    }

    /// Register a named transformer
    ///
    /// # Errors
    ///
    /// Returns an error if the registry lock is poisoned.
    pub fn register_transformer(
        &self,
        name: impl Into<String>,
        transform: Arc<dyn Transform>,
    ) -> Result<()> {
        self.inner.transformers.register(name, transform)
    }

    /// Collection transformer mapping elements to `element_type` through
    /// this mapper
    #[must_use]
    pub fn collection_transformer(&self, element_type: &str) -> CollectionTransformer {
        CollectionTransformer::new(element_type, self)
    }

    // ---- conventions ----

    pub fn use_conventions(&self, enabled: bool) {
        self.inner.use_conventions.store(enabled, Ordering::SeqCst);
        debug!("Convention discovery {}", if enabled { "enabled" } else { "disabled" });
    }

    #[must_use]
    pub fn conventions_enabled(&self) -> bool {
        self.inner.use_conventions.load(Ordering::SeqCst)
    }

    /// Set the convention threshold, clamped to `[0, 1]`
    pub fn set_convention_threshold(&self, threshold: f64) {
        self.conventions_mut().set_confidence_threshold(threshold);
    }

    #[must_use]
    pub fn convention_threshold(&self) -> f64 {
        self.conventions().threshold()
    }

    /// Add a naming convention after the ones already registered
    pub fn register_convention(&self, convention: Arc<dyn NamingConvention>) {
        self.conventions_mut().register_convention(convention);
    }

    #[must_use]
    pub fn calculate_confidence(&self, source: &str, destination: &str) -> f64 {
        self.conventions().calculate_confidence(source, destination)
    }

    #[must_use]
    pub fn discover_mappings(
        &self,
        source_type: &str,
        destination_type: &str,
    ) -> BTreeMap<String, String> {
        self.conventions()
            .discover_mappings(source_type, destination_type)
    }

    #[must_use]
    pub fn discover_with_confidence(
        &self,
        source_type: &str,
        destination_type: &str,
    ) -> Vec<DiscoveredMatch> {
        self.conventions()
            .discover_with_confidence(source_type, destination_type)
    }

    /// Register discovered pairs on a type mapping as explicit members
    ///
    /// # Errors
    ///
    /// Returns an error if the mapping is sealed.
    pub fn apply_conventions(&self, mapping: &TypeMapping) -> Result<usize> {
        self.conventions().apply_conventions(mapping)
    }

    // ---- resolution ----

    /// Hash of everything a plan for `key` depends on
    fn fingerprint(&self, key: &PairKey) -> Result<u64> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        self.conventions_enabled().hash(&mut hasher);
        {
            let conventions = self.conventions();
            conventions.threshold().to_bits().hash(&mut hasher);
            for convention in conventions.conventions() {
                convention.name().hash(&mut hasher);
            }
        }
        self.inner
            .introspector
            .list_properties(&key.source_type)
            .hash(&mut hasher);
        self.inner
            .introspector
            .list_properties(&key.destination_type)
            .hash(&mut hasher);
        for (name, member) in self.inner.storage.members(key)? {
            name.hash(&mut hasher);
            member.source_property().hash(&mut hasher);
            member.is_ignored().hash(&mut hasher);
            hash_member_shape(&member, &mut hasher);
        }
        Ok(hasher.finish())
    }

    /// Resolved plan for a pair, from the cache when it is current
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the pair cannot be sealed or the
    /// destination type is unknown.
    pub fn resolve_plan(
        &self,
        source_type: &str,
        destination_type: &str,
    ) -> Result<Arc<ResolvedPlan>> {
        let key = PairKey::new(source_type, destination_type);
        // a cached plan may come from another mapper sharing the cache
        if let Some(mapping) = self.type_mapping(source_type, destination_type) {
            mapping.seal()?;
        }
        let fingerprint = self.fingerprint(&key)?;
        if let Some(plan) = self
            .inner
            .cache
            .get_matching(source_type, destination_type, fingerprint)
        {
            return Ok(plan);
        }
        debug!("Cache miss for {}", key);
        let plan = self.build_plan(&key, fingerprint)?;
        Ok(self.inner.cache.put(plan))
    }

    fn build_plan(&self, key: &PairKey, fingerprint: u64) -> Result<ResolvedPlan> {
        let explicit = match self.type_mapping(&key.source_type, &key.destination_type) {
            Some(mapping) => {
                mapping.seal()?;
                mapping.members()?
            }
            None => BTreeMap::new(),
        };

        let open_destination = is_generic_map(&key.destination_type);
        let destination_properties = if open_destination {
            explicit.keys().cloned().collect()
        } else {
            self.inner
                .introspector
                .list_properties(&key.destination_type)
                .ok_or_else(|| {
                    Error::configuration(
                        &key.source_type,
                        &key.destination_type,
                        None,
                        ConfigurationIssue::UnknownDestinationType(key.destination_type.clone()),
                    )
                })?
        };

        let discovered: BTreeMap<String, (String, f64)> = if self.conventions_enabled() {
            self.discover_with_confidence(&key.source_type, &key.destination_type)
                .into_iter()
                .map(|m| (m.destination, (m.source, m.confidence)))
                .collect()
        } else {
            BTreeMap::new()
        };

        let members = destination_properties
            .into_iter()
            .map(|destination| {
                if let Some(mapping) = explicit.get(&destination) {
                    PlanMember {
                        source: mapping.source_property().map(str::to_string),
                        destination,
                        origin: PlanOrigin::Explicit,
                    }
                } else if let Some((source, confidence)) = discovered.get(&destination) {
                    PlanMember {
                        source: Some(source.clone()),
                        destination,
                        origin: PlanOrigin::Convention {
                            confidence: *confidence,
                        },
                    }
                } else {
                    PlanMember {
                        source: Some(destination.clone()),
                        destination,
                        origin: PlanOrigin::Direct,
                    }
                }
            })
            .collect();

        info!("Resolved plan for {}", key);
        Ok(ResolvedPlan {
            source_type: key.source_type.clone(),
            destination_type: key.destination_type.clone(),
            fingerprint,
            open_destination,
            members,
        })
    }

    /// Resolve and cache plans for known pairs ahead of time
    ///
    /// # Errors
    ///
    /// Returns the first pair's configuration error.
    pub fn warmup(&self, pairs: &[(&str, &str)]) -> Result<usize> {
        let keys: Vec<PairKey> = pairs.iter().map(|(s, d)| PairKey::new(*s, *d)).collect();
        self.inner.cache.warmup(&keys, |key| {
            let fingerprint = self.fingerprint(key)?;
            self.build_plan(key, fingerprint)
        })
    }

    pub fn clear_cache(&self) {
        self.inner.cache.clear();
    }

    // ---- mapping ----

    /// Map a source value to a new `destination_type` instance. The source
    /// type is the record's type name, or the generic map type for untyped
    /// objects, lists and JSON text.
    ///
    /// # Errors
    ///
    /// Returns configuration errors from sealing and transformer or
    /// condition errors unmodified.
    pub fn map(&self, source: &Value, destination_type: &str) -> Result<Value> {
        let source_type = source.type_name().unwrap_or(ARRAY_TYPE);
        let plan = self.resolve_plan(source_type, destination_type)?;
        let view = self.inner.introspector.normalize(source)?;
        let values = self.resolve_values(&plan, &view, false)?;
        self.inner.factory.instantiate(destination_type, values)
    }

    /// Map every source to `destination_type`
    ///
    /// # Errors
    ///
    /// Stops at the first failing element.
    pub fn map_array(&self, sources: &[Value], destination_type: &str) -> Result<Vec<Value>> {
        sources
            .iter()
            .map(|source| self.map(source, destination_type))
            .collect()
    }

    /// Map onto an existing destination. Only properties resolved from a
    /// present source key, a transformer or a default are written.
    ///
    /// # Errors
    ///
    /// Same as [`Mapper::map`]; also fails when `target` is not an object.
    pub fn map_to(&self, source: &Value, target: &mut Value) -> Result<()> {
        let source_type = source.type_name().unwrap_or(ARRAY_TYPE);
        let destination_type = target.type_name().unwrap_or(ARRAY_TYPE).to_string();
        let plan = self.resolve_plan(source_type, &destination_type)?;
        let view = self.inner.introspector.normalize(source)?;
        let values = self.resolve_values(&plan, &view, true)?;
        self.inner.factory.populate(target, values)
    }

    /// Map between serde types through the value model
    ///
    /// # Errors
    ///
    /// Returns serialization errors and any mapping error.
    pub fn map_struct<S, D>(&self, source_type: &str, source: &S, destination_type: &str) -> Result<D>
    where
        S: Serialize,
        D: DeserializeOwned,
    {
        let value = Value::from_serialize(source, Some(source_type))?;
        let mapped = self.map(&value, destination_type)?;
        Ok(mapped.deserialize_into()?)
    }

    fn resolve_values(
        &self,
        plan: &ResolvedPlan,
        view: &SourceView,
        provided_only: bool,
    ) -> Result<BTreeMap<String, Value>> {
        let explicit: BTreeMap<String, PropertyMapping> = if plan
            .members
            .iter()
            .any(|m| m.origin == PlanOrigin::Explicit)
        {
            self.inner
                .storage
                .members(&PairKey::new(&plan.source_type, &plan.destination_type))?
        } else {
            BTreeMap::new()
        };

        let discovered = self.discover_in_view(plan, view);
        let mut values = BTreeMap::new();
        let mut skipped = BTreeSet::new();

        for member in &plan.members {
            let destination = member.destination.as_str();
            match (&member.origin, explicit.get(destination)) {
                (PlanOrigin::Explicit, Some(mapping)) => {
                    if mapping.is_ignored() {
                        skipped.insert(destination);
                        continue;
                    }
                    let reference = mapping.source_property().unwrap_or(destination);
                    let raw = view.get(reference).cloned();
                    let provided = raw.is_some()
                        || mapping.transformer().is_some()
                        || mapping.has_default();
                    let value = mapping.transform_with(
                        raw.unwrap_or_default(),
                        view,
                        &self.inner.transformers,
                    )?;
                    trace!("{} <- {} (explicit): {:?}", destination, reference, value);
                    if provided || !provided_only {
                        values.insert(destination.to_string(), value);
                    }
                }
                _ => {
                    let reference = discovered
                        .get(destination)
                        .map(String::as_str)
                        .or(member.source.as_deref())
                        .unwrap_or(destination);
                    match view.get(reference) {
                        Some(value) => {
                            trace!("{} <- {}: {:?}", destination, reference, value);
                            values.insert(destination.to_string(), value.clone());
                        }
                        None if !provided_only => {
                            values.insert(destination.to_string(), Value::Null);
                        }
                        None => {}
                    }
                }
            }
        }

        if plan.open_destination {
            for (key, value) in view.fields() {
                if !values.contains_key(key) && !skipped.contains(key.as_str()) {
                    values.insert(key.clone(), value.clone());
                }
            }
        }

        Ok(values)
    }

    /// Convention matches against the keys of an untyped source. The type
    /// of a generic map cannot be reflected, so its direct members are
    /// matched per instance; keys present under the destination name keep
    /// mapping by exact name.
    fn discover_in_view(&self, plan: &ResolvedPlan, view: &SourceView) -> BTreeMap<String, String> {
        if !is_generic_map(&plan.source_type)
            || plan.open_destination
            || !self.conventions_enabled()
        {
            return BTreeMap::new();
        }
        let pending: Vec<String> = plan
            .members
            .iter()
            .filter(|m| m.origin == PlanOrigin::Direct && !view.contains(&m.destination))
            .map(|m| m.destination.clone())
            .collect();
        if pending.is_empty() {
            return BTreeMap::new();
        }

        let keys: Vec<String> = view.fields().keys().cloned().collect();
        self.conventions()
            .discover_properties(&keys, &pending)
            .into_iter()
            .map(|m| {
                trace!("{} <- {} (instance, {:.2})", m.destination, m.source, m.confidence);
                (m.destination, m.source)
            })
            .collect()
    }
}

/// Hash the transformer and condition kinds of a member. Closures and
/// transform objects only contribute their kind.
fn hash_member_shape(member: &PropertyMapping, hasher: &mut DefaultHasher) {
    match member.transformer() {
        None => 0u8.hash(hasher),
        Some(Transformer::Function(_)) => 1u8.hash(hasher),
        Some(Transformer::Object(_)) => 2u8.hash(hasher),
        Some(Transformer::Named(name)) => {
            3u8.hash(hasher);
            name.hash(hasher);
        }
    }
    match member.condition() {
        None => 0u8.hash(hasher),
        Some(Condition::Predicate(_)) => 1u8.hash(hasher),
        Some(Condition::Rule(rule)) => {
            2u8.hash(hasher);
            serde_json::to_string(rule)
                .unwrap_or_default()
                .hash(hasher);
        }
    }
    member.has_default().hash(hasher);
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Mapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("pairs", &self.inner.storage.pairs())
            .field("use_conventions", &self.conventions_enabled())
            .field("cache", self.inner.cache.policy())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use objmap_schema::TypeDescriptor;
    use objmap_value::Object;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    fn types() -> Arc<TypeRegistry> {
        let registry = TypeRegistry::new();
        registry.register(
            TypeDescriptor::new("UserRecord").with_properties(["user_id", "first_name", "email"]),
        );
        registry.register(
            TypeDescriptor::new("UserDto").with_properties(["userId", "firstName", "email"]),
        );
        registry.register(TypeDescriptor::new("UserEntity").with_properties(["id", "name"]));
        registry.register(TypeDescriptor::new("UserView").with_properties(["userId", "name"]));
        Arc::new(registry)
    }

    fn mapper() -> Mapper {
        Mapper::builder().introspector(types()).build()
    }

    fn record() -> Value {
        Value::Object(
            Object::typed("UserRecord")
                .with("user_id", 1)
                .with("first_name", "John")
                .with("email", "john@example.com"),
        )
    }

    #[test]
    fn test_plan_with_and_without_conventions() {
        let mapper = mapper();
        let plan = mapper.resolve_plan("UserRecord", "UserDto").unwrap();
        let mut discovered = plan.discovered();
        discovered.sort_unstable();
        assert_eq!(
            discovered,
            vec![
                ("email", "email"),
                ("firstName", "first_name"),
                ("userId", "user_id")
            ]
        );

        mapper.use_conventions(false);
        let plan = mapper.resolve_plan("UserRecord", "UserDto").unwrap();
        assert!(plan.discovered().is_empty());

        let dto = mapper.map(&record(), "UserDto").unwrap();
        assert_eq!(dto.get_path("userId"), Some(&Value::Null));
        assert_eq!(dto.get_path("email"), Some(&Value::from("john@example.com")));
    }

    #[test]
    fn test_explicit_members_outrank_conventions() {
        let mapper = mapper();
        mapper
            .create_map("UserRecord", "UserDto")
            .for_member("firstName", |m| {
                m.map_from("email").using_named("uppercase");
            })
            .unwrap();
        let dto = mapper.map(&record(), "UserDto").unwrap();
        assert_eq!(dto.get_path("firstName"), Some(&Value::from("JOHN@EXAMPLE.COM")));
        assert_eq!(dto.get_path("userId"), Some(&Value::Integer(1)));
        assert!(mapper.create_map("UserRecord", "UserDto").is_sealed().unwrap());
    }

    #[test]
    fn test_ignored_members_are_left_out() {
        let mapper = mapper();
        mapper
            .create_map("UserRecord", "UserDto")
            .for_member("email", |m| {
                m.ignore();
            })
            .unwrap();
        let dto = mapper.map(&record(), "UserDto").unwrap();
        assert!(dto.get_path("email").is_none());
    }

    #[test]
    fn test_cache_hit_and_miss_agree() {
        let mapper = mapper();
        let first = mapper.map(&record(), "UserDto").unwrap();
        assert_eq!(mapper.cache().len(), 1);
        let second = mapper.map(&record(), "UserDto").unwrap();
        assert_eq!(first, second);

        mapper.clear_cache();
        let third = mapper.map(&record(), "UserDto").unwrap();
        assert_eq!(first, third);
    }

    #[test]
    fn test_threshold_change_invalidates_plan() {
        let mapper = mapper();
        let plan = mapper.resolve_plan("UserRecord", "UserDto").unwrap();
        assert!(matches!(
            plan.member("userId").unwrap().origin,
            PlanOrigin::Convention { .. }
        ));

        mapper.set_convention_threshold(0.99);
        let plan = mapper.resolve_plan("UserRecord", "UserDto").unwrap();
        assert_eq!(plan.member("userId").unwrap().origin, PlanOrigin::Direct);
        assert_eq!(plan.discovered(), vec![("email", "email")]);
    }

    #[test]
    fn test_unknown_destination() {
        let mapper = mapper();
        let error = mapper.map(&record(), "Missing").unwrap_err();
        assert!(matches!(
            error.issue(),
            Some(ConfigurationIssue::UnknownDestinationType(t)) if t == "Missing"
        ));
    }

    #[test]
    fn test_generic_destination_copies_source() {
        let mapper = mapper();
        mapper
            .create_map("UserRecord", ARRAY_TYPE)
            .for_member("name", |m| {
                m.map_from("first_name");
            })
            .unwrap()
            .for_member("email", |m| {
                m.ignore();
            })
            .unwrap();
        let out = mapper.map(&record(), ARRAY_TYPE).unwrap();
        assert_eq!(out.type_name(), None);
        assert_eq!(out.get_path("name"), Some(&Value::from("John")));
        assert_eq!(out.get_path("user_id"), Some(&Value::Integer(1)));
        assert!(out.get_path("email").is_none());
    }

    #[test]
    fn test_reverse_map_inverts_plain_members() {
        let mapper = mapper();
        mapper
            .create_map("UserEntity", "UserView")
            .for_member("userId", |m| {
                m.map_from("id");
            })
            .unwrap();
        let reverse = mapper.create_reverse_map("UserEntity", "UserView").unwrap();
        assert_eq!(
            reverse.get_mapping("id").unwrap().unwrap().source_property(),
            Some("userId")
        );

        let view = Value::Object(Object::typed("UserView").with("userId", 7).with("name", "Ann"));
        let entity = mapper.map(&view, "UserEntity").unwrap();
        assert_eq!(entity.get_path("id"), Some(&Value::Integer(7)));
        assert_eq!(entity.get_path("name"), Some(&Value::from("Ann")));
    }

    #[test]
    fn test_map_to_writes_only_provided_values() {
        let mapper = mapper();
        let source = Value::Object(Object::typed("UserRecord").with("first_name", "Jane"));
        let mut target = Value::Object(
            Object::typed("UserDto")
                .with("userId", 9)
                .with("firstName", "old")
                .with("email", "keep@example.com"),
        );
        mapper.map_to(&source, &mut target).unwrap();
        assert_eq!(target.get_path("firstName"), Some(&Value::from("Jane")));
        assert_eq!(target.get_path("userId"), Some(&Value::Integer(9)));
        assert_eq!(target.get_path("email"), Some(&Value::from("keep@example.com")));
    }

    #[test]
    fn test_warmup_seals_pairs() {
        let mapper = mapper();
        let mapping = mapper.create_map("UserEntity", "UserView");
        mapping
            .for_member("userId", |m| {
                m.map_from("id");
            })
            .unwrap();
        assert_eq!(
            mapper
                .warmup(&[("UserEntity", "UserView"), ("UserRecord", "UserDto")])
                .unwrap(),
            2
        );
        assert!(mapping.is_sealed().unwrap());
        assert_eq!(mapper.cache().len(), 2);
    }

    #[test]
    fn test_concurrent_mapping() {
        let mapper = mapper();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let mapper = mapper.clone();
                thread::spawn(move || mapper.map(&record(), "UserDto").unwrap())
            })
            .collect();
        let results: Vec<Value> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(results.windows(2).all(|w| w[0] == w[1]));
    }

    #[test]
    fn test_concurrent_seal_and_map_on_configured_pair() {
        struct CountingValidation(AtomicUsize);
        impl Transform for CountingValidation {
            fn transform(&self, value: Value, _source: &SourceView) -> Result<Value> {
                Ok(value)
            }
            fn validate(&self) -> std::result::Result<(), String> {
                self.0.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        }

        let mapper = mapper();
        let validations = Arc::new(CountingValidation(AtomicUsize::new(0)));
        let mapping = mapper.create_map("UserRecord", "UserDto");
        mapping
            .for_member("firstName", |m| {
                m.map_from("first_name")
                    .using_transform(Arc::clone(&validations) as Arc<dyn Transform>);
            })
            .unwrap();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let mapper = mapper.clone();
                let mapping = mapping.clone();
                thread::spawn(move || {
                    if i % 2 == 0 {
                        mapping.seal().map(|()| None)
                    } else {
                        mapper.map(&record(), "UserDto").map(Some)
                    }
                })
            })
            .collect();

        for handle in handles {
            if let Some(dto) = handle.join().unwrap().unwrap() {
                assert_eq!(dto.get_path("firstName"), Some(&Value::from("John")));
            }
        }
        assert!(mapping.is_sealed().unwrap());
        assert_eq!(validations.0.load(Ordering::SeqCst), 1);
    }
}
