//! Type descriptor model

/// Ordered description of a type's public properties
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub name: String,
    pub parent: Option<String>,
    pub properties: Vec<PropertyDescriptor>,
}

/// Definition of a single property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub name: String,
    pub data_type: Option<String>,
    pub nullable: bool,
}

impl TypeDescriptor {
    /// Create a descriptor with no properties
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            properties: Vec::new(),
        }
    }

    /// Declare the parent type
    #[must_use]
    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Append an untyped, nullable property
    #[must_use]
    pub fn with_property(mut self, name: impl Into<String>) -> Self {
        self.properties.push(PropertyDescriptor::new(name));
        self
    }

    /// Append several untyped properties in order
    #[must_use]
    pub fn with_properties<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.properties
            .extend(names.into_iter().map(PropertyDescriptor::new));
        self
    }

    /// Append a fully described property
    #[must_use]
    pub fn with_descriptor(mut self, property: PropertyDescriptor) -> Self {
        self.properties.push(property);
        self
    }

    /// Property names in declaration order
    #[must_use]
    pub fn property_names(&self) -> Vec<String> {
        self.properties.iter().map(|p| p.name.clone()).collect()
    }

    /// Check whether the type declares a property
    #[must_use]
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|p| p.name == name)
    }

    /// Look up a property by name
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.iter().find(|p| p.name == name)
    }
}

impl PropertyDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
            nullable: true,
        }
    }

    #[must_use]
    pub fn typed(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.nullable = false;
        self
    }
}
