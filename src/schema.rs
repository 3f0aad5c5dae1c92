use crate::error::{CboxError, CboxResult};

/// How replies targeting a field accumulate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    Sequence,
    /// First argument is the key, the rest the value; last write wins per key.
    Mapping,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<Field>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scalar(self, name: &str) -> Self {
        self.with(name, FieldKind::Scalar)
    }

    pub fn sequence(self, name: &str) -> Self {
        self.with(name, FieldKind::Sequence)
    }

    pub fn mapping(self, name: &str) -> Self {
        self.with(name, FieldKind::Mapping)
    }

    /// Adds a field. Declaring a name again replaces its earlier cardinality.
    pub fn with(mut self, name: &str, kind: FieldKind) -> Self {
        self.fields.retain(|f| f.name != name);
        self.fields.push(Field {
            name: name.to_string(),
            kind,
        });
        self
    }

    /// Parses the marker notation used by older call sites: `*name` is a
    /// sequence, `%name` a mapping, anything else a scalar.
    pub fn parse(names: &[&str]) -> CboxResult<Self> {
        let mut fields: Vec<Field> = Vec::with_capacity(names.len());
        for raw in names {
            let (name, kind) = if let Some(n) = raw.strip_prefix('*') {
                (n, FieldKind::Sequence)
            } else if let Some(n) = raw.strip_prefix('%') {
                (n, FieldKind::Mapping)
            } else {
                (*raw, FieldKind::Scalar)
            };
            if name.is_empty() || fields.iter().any(|f| f.name == name) {
                return Err(CboxError::DuplicateField(raw.to_string()));
            }
            fields.push(Field {
                name: name.to_string(),
                kind,
            });
        }
        Ok(Self { fields })
    }

    pub fn kind_of(&self, name: &str) -> Option<FieldKind> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.kind)
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
