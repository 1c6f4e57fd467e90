use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabula::tabula_data::schema::SchemaError;
use tabula::tabula_data::{ColumnType, Entity, EntitySchema, SchemaRegistry};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub role: String,
    pub created_at: String,
    pub updated_at: String,
}

impl Entity for User {
    const NAME: &'static str = "User";

    fn schema() -> Result<EntitySchema, SchemaError> {
        EntitySchema::builder(Self::NAME, "users")
            .primary("id", ColumnType::Integer)
            .column("email", ColumnType::Text)
            .column("name", ColumnType::Text)
            .column("role", ColumnType::Text)
            .mapped_column("createdAt", "created_at", ColumnType::Timestamp)
            .mapped_column("updatedAt", "updated_at", ColumnType::Timestamp)
            .many_to_one("project", "Project", "project_id")
            .one_to_many("formSubmissions", "FormSubmission", "user_id")
            .one_to_many("uploads", "Asset", "user_id")
            .build()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub admin_id: Option<i64>,
    pub created_at: String,
    pub deleted_at: Option<String>,
}

impl Entity for Project {
    const NAME: &'static str = "Project";

    fn schema() -> Result<EntitySchema, SchemaError> {
        EntitySchema::builder(Self::NAME, "projects")
            .primary("id", ColumnType::Integer)
            .column("name", ColumnType::Text)
            .mapped_column("adminId", "admin_id", ColumnType::Integer)
            .mapped_column("createdAt", "created_at", ColumnType::Timestamp)
            .mapped_column("updatedAt", "updated_at", ColumnType::Timestamp)
            .soft_delete_column("deletedAt", "deleted_at")
            .one_to_many("users", "User", "project_id")
            .build()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    pub id: i64,
    pub title: String,
    pub is_active: bool,
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Entity for Form {
    const NAME: &'static str = "Form";

    fn schema() -> Result<EntitySchema, SchemaError> {
        EntitySchema::builder(Self::NAME, "forms")
            .primary("id", ColumnType::Integer)
            .column("title", ColumnType::Text)
            .mapped_column("isActive", "is_active", ColumnType::Boolean)
            .column("description", ColumnType::Text)
            .column("type", ColumnType::Text)
            .mapped_column("adminId", "admin_id", ColumnType::Integer)
            .mapped_column("approvalFlow", "approval_flow", ColumnType::Text)
            .mapped_column("createdAt", "created_at", ColumnType::Timestamp)
            .one_to_many("fields", "FormField", "form_id")
            .build()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormField {
    pub id: i64,
    pub label: String,
    pub key: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub required: bool,
    pub options: Option<Value>,
    pub order: i64,
}

impl Entity for FormField {
    const NAME: &'static str = "FormField";

    fn schema() -> Result<EntitySchema, SchemaError> {
        EntitySchema::builder(Self::NAME, "form_fields")
            .primary("id", ColumnType::Integer)
            .column("label", ColumnType::Text)
            .column("key", ColumnType::Text)
            .column("placeholder", ColumnType::Text)
            .column("type", ColumnType::Text)
            .column("required", ColumnType::Boolean)
            .column("options", ColumnType::Json)
            .column("length", ColumnType::Integer)
            .column("order", ColumnType::Integer)
            .mapped_column("createdAt", "created_at", ColumnType::Timestamp)
            .many_to_one("form", "Form", "form_id")
            .build()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSubmission {
    pub id: i64,
    pub is_check: bool,
    pub answers: Value,
    pub score: Option<i64>,
}

impl Entity for FormSubmission {
    const NAME: &'static str = "FormSubmission";

    fn schema() -> Result<EntitySchema, SchemaError> {
        EntitySchema::builder(Self::NAME, "form_submissions")
            .primary("id", ColumnType::Integer)
            .mapped_column("isCheck", "is_check", ColumnType::Boolean)
            .column("answers", ColumnType::Json)
            .column("score", ColumnType::Integer)
            .mapped_column("createdAt", "created_at", ColumnType::Timestamp)
            .many_to_one("user", "User", "user_id")
            .build()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Asset {
    pub id: String,
    pub filename: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub category: String,
    pub mime_type: Option<String>,
    pub size: Option<i64>,
}

impl Entity for Asset {
    const NAME: &'static str = "Asset";

    fn schema() -> Result<EntitySchema, SchemaError> {
        EntitySchema::builder(Self::NAME, "assets")
            .primary("id", ColumnType::Uuid)
            .column("filename", ColumnType::Text)
            .column("url", ColumnType::Text)
            .column("type", ColumnType::Text)
            .column("category", ColumnType::Text)
            .mapped_column("mimeType", "mime_type", ColumnType::Text)
            .column("size", ColumnType::Integer)
            .mapped_column("createdAt", "created_at", ColumnType::Timestamp)
            .mapped_column("updatedAt", "updated_at", ColumnType::Timestamp)
            .soft_delete_column("deletedAt", "deleted_at")
            .many_to_one("user", "User", "user_id")
            .build()
    }
}

/// URL segment and entity name of every exposed resource.
pub const RESOURCES: &[(&str, &str)] = &[
    ("users", User::NAME),
    ("projects", Project::NAME),
    ("forms", Form::NAME),
    ("form-fields", FormField::NAME),
    ("form-submissions", FormSubmission::NAME),
    ("assets", Asset::NAME),
];

pub fn registry() -> Result<SchemaRegistry, SchemaError> {
    SchemaRegistry::builder()
        .entity::<User>()
        .entity::<Project>()
        .entity::<Form>()
        .entity::<FormField>()
        .entity::<FormSubmission>()
        .entity::<Asset>()
        .build()
}
