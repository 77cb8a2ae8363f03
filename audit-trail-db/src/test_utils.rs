use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::ValueError;
use crate::metadata::{EntityTypeBuilder, KeyGeneration, ModelRegistry};
use crate::models::audit::{ChangeHeaderModel, OperationKind};
use crate::models::capability::{Capability, FullyAuditable, TenantScoped, Timestamped};
use crate::models::entity::{Entity, EntityType};
use crate::models::value::{PropertyBag, PropertyValue, ValueKind};
use crate::utils::to_bounded_lossy;

/// Fully auditable, tenant scoped customer with a generated key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    pub id: Option<i64>,
    pub display_name: String,
    pub email: Option<String>,
    pub closed_reason: Option<String>,
    pub is_deleted: bool,
    pub tenant_id: Option<Uuid>,
    pub created_at: Option<DateTime<Utc>>,
    pub created_by: Option<Uuid>,
    pub modified_at: Option<DateTime<Utc>>,
    pub modified_by: Option<Uuid>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<Uuid>,
}

pub fn create_test_customer(name: &str) -> Customer {
    Customer {
        id: None,
        display_name: name.to_string(),
        email: None,
        closed_reason: None,
        is_deleted: false,
        tenant_id: None,
        created_at: None,
        created_by: None,
        modified_at: None,
        modified_by: None,
        deleted_at: None,
        deleted_by: None,
    }
}

impl Entity for Customer {
    fn entity_name(&self) -> &'static str {
        Self::ENTITY_NAME
    }

    fn key(&self) -> Option<PropertyValue> {
        self.id.map(PropertyValue::from)
    }

    fn set_key(&mut self, key: PropertyValue) {
        if let PropertyValue::Int(id) = key {
            self.id = id;
        }
    }

    fn values(&self) -> PropertyBag {
        PropertyBag::new()
            .with("id", self.id)
            .with("display_name", self.display_name.as_str())
            .with("email", self.email.clone())
            .with("closed_reason", self.closed_reason.clone())
            .with("is_deleted", self.is_deleted)
            .with("tenant_id", self.tenant_id)
            .with("created_at", self.created_at)
            .with("created_by", self.created_by)
            .with("modified_at", self.modified_at)
            .with("modified_by", self.modified_by)
            .with("deleted_at", self.deleted_at)
            .with("deleted_by", self.deleted_by)
    }

    fn as_timestamped_mut(&mut self) -> Option<&mut dyn Timestamped> {
        Some(self)
    }

    fn as_fully_auditable(&self) -> Option<&dyn FullyAuditable> {
        Some(self)
    }

    fn as_fully_auditable_mut(&mut self) -> Option<&mut dyn FullyAuditable> {
        Some(self)
    }

    fn as_tenant_scoped(&self) -> Option<&dyn TenantScoped> {
        Some(self)
    }

    fn as_tenant_scoped_mut(&mut self) -> Option<&mut dyn TenantScoped> {
        Some(self)
    }
}

impl EntityType for Customer {
    const ENTITY_NAME: &'static str = "Customer";

    fn configure(entity: &mut EntityTypeBuilder) {
        entity
            .table("customers")
            .key("id", KeyGeneration::Generated)
            .capability(Capability::FullyAuditable)
            .capability(Capability::PropertyChangeAuditable)
            .capability(Capability::TenantScoped)
            .deletion_flag("is_deleted")
            .tenant_property("tenant_id");
        entity.property("id", ValueKind::Int).tracked();
        entity.property("display_name", ValueKind::Text).column("name").tracked();
        entity.property("email", ValueKind::Text).tracked();
        entity.property("closed_reason", ValueKind::Text).tracked();
        entity.property("is_deleted", ValueKind::Bool).tracked();
        entity.property("tenant_id", ValueKind::Uuid);
        entity.property("created_at", ValueKind::Timestamp);
        entity.property("created_by", ValueKind::Uuid);
        entity.property("modified_at", ValueKind::Timestamp);
        entity.property("modified_by", ValueKind::Uuid);
        entity.property("deleted_at", ValueKind::Timestamp);
        entity.property("deleted_by", ValueKind::Uuid);
        entity.navigation("orders");
    }

    fn from_values(values: &PropertyBag) -> Result<Self, ValueError> {
        Ok(Customer {
            id: values.get_as("id")?,
            display_name: values.get_as("display_name")?,
            email: values.get_as("email")?,
            closed_reason: values.get_as("closed_reason")?,
            is_deleted: values.get_as("is_deleted")?,
            tenant_id: values.get_as("tenant_id")?,
            created_at: values.get_as("created_at")?,
            created_by: values.get_as("created_by")?,
            modified_at: values.get_as("modified_at")?,
            modified_by: values.get_as("modified_by")?,
            deleted_at: values.get_as("deleted_at")?,
            deleted_by: values.get_as("deleted_by")?,
        })
    }
}

impl Timestamped for Customer {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    fn set_created_at(&mut self, at: DateTime<Utc>) {
        self.created_at = Some(at);
    }

    fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.modified_at
    }

    fn set_modified_at(&mut self, at: DateTime<Utc>) {
        self.modified_at = Some(at);
    }
}

impl FullyAuditable for Customer {
    fn created_by(&self) -> Option<Uuid> {
        self.created_by
    }

    fn set_created_by(&mut self, by: Option<Uuid>) {
        self.created_by = by;
    }

    fn modified_by(&self) -> Option<Uuid> {
        self.modified_by
    }

    fn set_modified_by(&mut self, by: Option<Uuid>) {
        self.modified_by = by;
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn set_deleted(&mut self, deleted: bool) {
        self.is_deleted = deleted;
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }

    fn set_deleted_at(&mut self, at: Option<DateTime<Utc>>) {
        self.deleted_at = at;
    }

    fn deleted_by(&self) -> Option<Uuid> {
        self.deleted_by
    }

    fn set_deleted_by(&mut self, by: Option<Uuid>) {
        self.deleted_by = by;
    }
}

impl TenantScoped for Customer {
    fn tenant_id(&self) -> Option<Uuid> {
        self.tenant_id
    }

    fn set_tenant_id(&mut self, tenant_id: Option<Uuid>) {
        self.tenant_id = tenant_id;
    }
}

/// Property-change auditable account with a masked password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Option<i64>,
    pub username: String,
    pub password_hash: Option<String>,
}

pub fn create_test_account(password_hash: &str) -> Account {
    Account {
        id: None,
        username: "alice".to_string(),
        password_hash: Some(password_hash.to_string()),
    }
}

impl Entity for Account {
    fn entity_name(&self) -> &'static str {
        Self::ENTITY_NAME
    }

    fn key(&self) -> Option<PropertyValue> {
        self.id.map(PropertyValue::from)
    }

    fn set_key(&mut self, key: PropertyValue) {
        if let PropertyValue::Int(id) = key {
            self.id = id;
        }
    }

    fn values(&self) -> PropertyBag {
        PropertyBag::new()
            .with("id", self.id)
            .with("username", self.username.as_str())
            .with("password_hash", self.password_hash.clone())
    }
}

impl EntityType for Account {
    const ENTITY_NAME: &'static str = "Account";

    fn configure(entity: &mut EntityTypeBuilder) {
        entity
            .table("accounts")
            .capability(Capability::PropertyChangeAuditable);
        entity.property("id", ValueKind::Int);
        entity.property("username", ValueKind::Text).tracked();
        entity.property("password_hash", ValueKind::Text).hide_values();
    }

    fn from_values(values: &PropertyBag) -> Result<Self, ValueError> {
        Ok(Account {
            id: values.get_as("id")?,
            username: values.get_as("username")?,
            password_hash: values.get_as("password_hash")?,
        })
    }
}

/// Plain entity without any capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: Option<i64>,
    pub body: String,
}

pub fn create_test_note(body: &str) -> Note {
    Note {
        id: None,
        body: body.to_string(),
    }
}

impl Entity for Note {
    fn entity_name(&self) -> &'static str {
        Self::ENTITY_NAME
    }

    fn key(&self) -> Option<PropertyValue> {
        self.id.map(PropertyValue::from)
    }

    fn set_key(&mut self, key: PropertyValue) {
        if let PropertyValue::Int(id) = key {
            self.id = id;
        }
    }

    fn values(&self) -> PropertyBag {
        PropertyBag::new().with("id", self.id).with("body", self.body.as_str())
    }
}

impl EntityType for Note {
    const ENTITY_NAME: &'static str = "Note";

    fn configure(entity: &mut EntityTypeBuilder) {
        entity.table("notes");
        entity.property("id", ValueKind::Int);
        entity.property("body", ValueKind::Text);
    }

    fn from_values(values: &PropertyBag) -> Result<Self, ValueError> {
        Ok(Note {
            id: values.get_as("id")?,
            body: values.get_as("body")?,
        })
    }
}

/// Child of a customer with an application-assigned key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Option<i64>,
    pub total: Decimal,
    pub status: String,
}

pub fn create_test_order(customer_id: i64) -> Order {
    Order {
        id: Uuid::new_v4(),
        customer_id: Some(customer_id),
        total: Decimal::ZERO,
        status: "open".to_string(),
    }
}

impl Entity for Order {
    fn entity_name(&self) -> &'static str {
        Self::ENTITY_NAME
    }

    fn key(&self) -> Option<PropertyValue> {
        Some(self.id.into())
    }

    fn set_key(&mut self, key: PropertyValue) {
        if let PropertyValue::Uuid(Some(id)) = key {
            self.id = id;
        }
    }

    fn values(&self) -> PropertyBag {
        PropertyBag::new()
            .with("id", self.id)
            .with("customer_id", self.customer_id)
            .with("total", self.total)
            .with("status", self.status.as_str())
    }
}

impl EntityType for Order {
    const ENTITY_NAME: &'static str = "Order";

    fn configure(entity: &mut EntityTypeBuilder) {
        entity
            .table("orders")
            .key("id", KeyGeneration::Client)
            .capability(Capability::PropertyChangeAuditable)
            .parent("customer_id", "Customer");
        entity.property("id", ValueKind::Uuid);
        entity.property("customer_id", ValueKind::Int);
        entity.property("total", ValueKind::Decimal).tracked();
        entity.property("status", ValueKind::Text).tracked();
    }

    fn from_values(values: &PropertyBag) -> Result<Self, ValueError> {
        Ok(Order {
            id: values.get_as("id")?,
            customer_id: values.get_as("customer_id")?,
            total: values.get_as("total")?,
            status: values.get_as("status")?,
        })
    }
}

pub fn create_test_registry() -> ModelRegistry {
    ModelRegistry::builder()
        .entity::<Customer>()
        .entity::<Account>()
        .entity::<Note>()
        .entity::<Order>()
        .build()
        .expect("test model is valid")
}

pub fn create_test_change_header(operation_kind: OperationKind) -> ChangeHeaderModel {
    ChangeHeaderModel {
        id: Uuid::new_v4(),
        transaction_id: Uuid::new_v4(),
        correlation_id: None,
        entity_type_name: to_bounded_lossy("Customer"),
        table_name: to_bounded_lossy("customers"),
        operation_kind,
        owning_entity_id: None,
        parent_entity_name: None,
        parent_entity_id: None,
        changed_by: None,
        changed_at: Utc::now(),
        property_diffs: Vec::new(),
    }
}
