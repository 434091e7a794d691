use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Identifier of a backend record. The backend uses numeric ids, but the
/// table only needs them to be displayable and comparable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl RecordId {
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(RecordId::Number),
            Value::String(s) if !s.is_empty() => Some(RecordId::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

/// One entity instance as returned by the backend.
///
/// Fields are kept schema-free; screens describe which keys they care about
/// through [`ColumnDescriptor`]s and form field specs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record(pub Map<String, Value>);

impl Record {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Build a record from a JSON object. Anything else yields `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self(map)),
            _ => None,
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn id(&self) -> Option<RecordId> {
        self.0.get("id").and_then(RecordId::from_value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: &str, value: Value) {
        self.0.insert(key.to_string(), value);
    }

    /// Look up a dotted path such as `details.0.saldo_awal`. Numeric
    /// segments index arrays.
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.0.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                Value::Object(map) => map.get(segment)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Write a dotted path, creating the objects and arrays along the way.
    pub fn set_path(&mut self, path: &str, value: Value) {
        let segments: Vec<&str> = path.split('.').collect();
        let Some((head, tail)) = segments.split_first() else {
            return;
        };
        let slot = self.0.entry(head.to_string()).or_insert(Value::Null);
        set_in(slot, tail, value);
    }

    /// String form of a field, as shown in a table cell.
    pub fn display(&self, key: &str) -> String {
        display_value(self.0.get(key))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn set_in(slot: &mut Value, path: &[&str], value: Value) {
    let Some((head, tail)) = path.split_first() else {
        *slot = value;
        return;
    };
    let child = match head.parse::<usize>() {
        Ok(index) => {
            if !slot.is_array() {
                *slot = Value::Array(Vec::new());
            }
            let Value::Array(items) = slot else {
                return;
            };
            if items.len() <= index {
                items.resize(index + 1, Value::Null);
            }
            &mut items[index]
        }
        Err(_) => {
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            let Value::Object(map) = slot else {
                return;
            };
            map.entry(head.to_string()).or_insert(Value::Null)
        }
    };
    set_in(child, tail, value);
}

/// Coerce a JSON field into the text a browser would print for it.
///
/// A missing key prints as `undefined` and an object as `[object Object]`,
/// the same text a browser prints for them.
pub fn display_value(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => display_number(n),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| match item {
                Value::Null => String::new(),
                other => display_value(Some(other)),
            })
            .collect::<Vec<_>>()
            .join(","),
        Some(Value::Object(_)) => "[object Object]".to_string(),
    }
}

fn display_number(n: &serde_json::Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{}", f as i64),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Pairing of a record field and the header shown above it.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    pub key: String,
    pub header: String,
}

impl ColumnDescriptor {
    pub fn new(key: &str, header: &str) -> Self {
        Self {
            key: key.to_string(),
            header: header.to_string(),
        }
    }
}

/// Server-side pagination position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageState {
    pub current_page: u32,
    pub total_pages: u32,
}

impl Default for PageState {
    fn default() -> Self {
        Self {
            current_page: 1,
            total_pages: 0,
        }
    }
}

impl PageState {
    /// Build a page state, clamping `current_page` into `1..=max(total_pages, 1)`.
    pub fn new(current_page: u32, total_pages: u32) -> Self {
        let upper = total_pages.max(1);
        Self {
            current_page: current_page.clamp(1, upper),
            total_pages,
        }
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    pub fn contains(&self, page: u32) -> bool {
        page >= 1 && page <= self.total_pages
    }
}

/// Laravel-style paginator payload.
#[derive(Debug, Clone, Deserialize)]
pub struct Paginated {
    pub data: Vec<Value>,
    pub current_page: u32,
    pub last_page: u32,
    #[serde(default)]
    pub per_page: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// Outer envelope used by every endpoint: `{ "data": ... }`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// One decoded page of records.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordPage {
    pub records: Vec<Record>,
    pub page: PageState,
    pub per_page: Option<u32>,
    pub total: Option<u64>,
}

/// Query parameters for a list read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub page: u32,
    pub per_page: u32,
}

impl ListQuery {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub data: Option<User>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Kind of editable field in a record form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Number,
    Dropdown,
    Checkbox,
}

/// Where a dropdown gets its options from.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    /// Path below the API root, e.g. `products/units`
    pub path: String,
    /// Field of each lookup row used as the option label and value
    pub label_key: String,
}

/// Description of one field in the record editor.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    /// Field name, or a dotted path into nested data
    pub key: String,
    pub label: String,
    pub kind: FieldKind,
    pub required: bool,
    pub lookup: Option<Lookup>,
    pub default: Option<Value>,
}

impl FieldSpec {
    pub fn new(key: &str, label: &str, kind: FieldKind) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            kind,
            required: false,
            lookup: None,
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_lookup(mut self, path: &str, label_key: &str) -> Self {
        self.lookup = Some(Lookup {
            path: path.to_string(),
            label_key: label_key.to_string(),
        });
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Value this field holds in an empty draft.
    pub fn default_value(&self) -> Value {
        if let Some(value) = &self.default {
            return value.clone();
        }
        match self.kind {
            FieldKind::Checkbox => Value::Bool(false),
            _ => Value::String(String::new()),
        }
    }
}

/// Opening balance, prices and stock of a product, kept under `details[0]`.
const PRICING_FIELDS: [(&str, &str); 9] = [
    ("saldo_awal", "Saldo Awal"),
    ("hargajualkarton", "Harga Jual Karton"),
    ("hargajualeceran", "Harga Jual Eceran"),
    ("hargabelikarton", "Harga Beli Karton"),
    ("hargabelieceran", "Harga Beli Eceran"),
    ("hppavgkarton", "HPP Avg Karton"),
    ("hppavgeceran", "HPP Avg Eceran"),
    ("current_stock", "Current Stock"),
    ("nilai_akhir", "Nilai Akhir"),
];

/// Entity types managed by the console.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Categories,
    Products,
}

impl EntityKind {
    pub fn parse(s: &str) -> Result<Self, anyhow::Error> {
        match s.to_lowercase().as_str() {
            "categories" | "category" | "kategori" => Ok(EntityKind::Categories),
            "products" | "product" | "barang" => Ok(EntityKind::Products),
            other => Err(anyhow::anyhow!(
                "Unsupported entity: {}. Supported entities: categories, products",
                other
            )),
        }
    }

    /// Resource segment below `/api`.
    pub fn resource(&self) -> &'static str {
        match self {
            EntityKind::Categories => "categories",
            EntityKind::Products => "products",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            EntityKind::Categories => "Categories",
            EntityKind::Products => "Products",
        }
    }

    pub fn menu_label(&self) -> &'static str {
        match self {
            EntityKind::Categories => "Kategori Barang",
            EntityKind::Products => "Barang",
        }
    }

    /// Message shown in place of the table when a page cannot be loaded.
    pub fn fetch_error(&self) -> &'static str {
        match self {
            EntityKind::Categories => "Failed to fetch category",
            EntityKind::Products => "Failed to fetch product",
        }
    }

    pub fn search_placeholder(&self) -> &'static str {
        match self {
            EntityKind::Categories => "Search nama kategori...",
            EntityKind::Products => "Search nama barang...",
        }
    }

    pub fn columns(&self) -> Vec<ColumnDescriptor> {
        match self {
            EntityKind::Categories => vec![
                ColumnDescriptor::new("id", "ID"),
                ColumnDescriptor::new("nama_kategori", "Nama Kategori"),
                ColumnDescriptor::new("created_by", "Created by"),
                ColumnDescriptor::new("created_at", "Created at"),
            ],
            EntityKind::Products => vec![
                ColumnDescriptor::new("id", "ID"),
                ColumnDescriptor::new("nama_barang", "Nama Barang"),
                ColumnDescriptor::new("created_by", "Created by"),
                ColumnDescriptor::new("created_at", "Created at"),
            ],
        }
    }

    pub fn fields(&self) -> Vec<FieldSpec> {
        match self {
            EntityKind::Categories => vec![
                FieldSpec::new("nama_kategori", "Nama Kategori", FieldKind::Text).required(),
            ],
            EntityKind::Products => vec![
                FieldSpec::new("kodebarcode", "Kode Barcode", FieldKind::Text),
                FieldSpec::new("nama_barang", "Nama Barang", FieldKind::Text).required(),
                FieldSpec::new("satuan", "Satuan Barang", FieldKind::Dropdown)
                    .with_lookup("products/units", "nama_satuan"),
                FieldSpec::new("isi", "Isi", FieldKind::Number),
                FieldSpec::new("kategori", "Kategori Barang", FieldKind::Dropdown)
                    .with_lookup("products/categories", "nama_kategori"),
                FieldSpec::new("pajak", "Pajak", FieldKind::Checkbox),
            ]
            .into_iter()
            .chain(PRICING_FIELDS.iter().map(|(key, label)| {
                FieldSpec::new(&format!("details.0.{}", key), label, FieldKind::Number).with_default(0)
            }))
            .collect(),
        }
    }

    /// Products carry more fields than the list endpoint returns, so the
    /// editor loads the full record before seeding.
    pub fn loads_detail(&self) -> bool {
        matches!(self, EntityKind::Products)
    }
}
