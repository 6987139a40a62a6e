//! Descriptor tables of the tutorial operations.

use kanon_bind::{
    CustomValidator, Endpoint, ExtraPolicy, FieldBuilder, FieldSpec, ModelSpec, ParamType, ParameterSpec,
    SpecError, Value,
};

/// Members of the `ModelName` enumeration.
pub const MODEL_NAMES: [&str; 3] = ["alexnet", "resnet", "lenet"];

pub(super) fn root() -> Result<Endpoint, SpecError> {
    Endpoint::builder("root").build()
}

pub(super) fn read_item() -> Result<Endpoint, SpecError> {
    Endpoint::builder("read_item")
        .param(ParameterSpec::path("item_id", ParamType::Integer))
        .build()
}

pub(super) fn read_user_me() -> Result<Endpoint, SpecError> {
    Endpoint::builder("read_user_me").build()
}

pub(super) fn read_user() -> Result<Endpoint, SpecError> {
    Endpoint::builder("read_user")
        .param(ParameterSpec::path("user_id", ParamType::String))
        .build()
}

pub(super) fn get_model() -> Result<Endpoint, SpecError> {
    Endpoint::builder("get_model")
        .param(ParameterSpec::path(
            "model_name",
            ParamType::enumeration(MODEL_NAMES),
        ))
        .build()
}

pub(super) fn read_file() -> Result<Endpoint, SpecError> {
    Endpoint::builder("read_file")
        .param(
            ParameterSpec::path("file_path", ParamType::String).describe("may contain slashes"),
        )
        .build()
}

pub(super) fn list_items() -> Result<Endpoint, SpecError> {
    Endpoint::builder("list_items")
        .param(ParameterSpec::query("skip", ParamType::Integer).default(0_i64))
        .param(ParameterSpec::query("limit", ParamType::Integer).default(10_i64))
        .build()
}

pub(super) fn read_item_detail() -> Result<Endpoint, SpecError> {
    Endpoint::builder("read_item_detail")
        .param(ParameterSpec::path("item_id", ParamType::String))
        .param(ParameterSpec::query("q", ParamType::String).optional())
        .param(ParameterSpec::query("short", ParamType::Boolean).default(false))
        .build()
}

pub(super) fn read_user_item() -> Result<Endpoint, SpecError> {
    Endpoint::builder("read_user_item")
        .param(ParameterSpec::path("user_id", ParamType::Integer))
        .param(ParameterSpec::path("item_id", ParamType::String))
        .param(ParameterSpec::query("needy", ParamType::String))
        .param(ParameterSpec::query("q", ParamType::String).optional())
        .param(ParameterSpec::query("short", ParamType::Boolean).default(false))
        .build()
}

/// The `Item` body model.
#[must_use]
pub fn item_model() -> ModelSpec {
    ModelSpec::new("Item")
        .field(
            FieldSpec::new("name", ParamType::String).validator(CustomValidator::new(
                "not_blank",
                |value| match value.as_str() {
                    Some(name) if name.trim().is_empty() => {
                        Err("name must not be blank".to_string())
                    }
                    _ => Ok(()),
                },
            )),
        )
        .field(FieldSpec::new("description", ParamType::String).optional())
        .field(FieldSpec::new("price", ParamType::Float))
        .field(FieldSpec::new("tax", ParamType::Float).optional())
}

pub(super) fn create_item() -> Result<Endpoint, SpecError> {
    Endpoint::builder("create_item")
        .param(ParameterSpec::path("item_id", ParamType::Integer))
        .param(ParameterSpec::body("item", ParamType::object(item_model())))
        .build()
}

pub(super) fn read_items_filtered() -> Result<Endpoint, SpecError> {
    Endpoint::builder("read_items_filtered")
        .param(
            ParameterSpec::query("tags", ParamType::list(ParamType::String))
                .default(Value::List(Vec::new())),
        )
        .param(
            ParameterSpec::query("q", ParamType::String)
                .optional()
                .min_length(3)
                .max_length(50)
                .pattern("^[A-Za-z0-9 ]+$")
                .describe("search text"),
        )
        .param(ParameterSpec::query("page", ParamType::Integer).default(1_i64).ge(1.0))
        .build()
}

pub(super) fn read_headers() -> Result<Endpoint, SpecError> {
    Endpoint::builder("read_headers")
        .param(ParameterSpec::header("user_agent", ParamType::String).optional())
        .param(ParameterSpec::header("x_token", ParamType::list(ParamType::String)).optional())
        .build()
}

/// The `Cookies` parameter model.
#[must_use]
pub fn cookies_model() -> ModelSpec {
    ModelSpec::new("Cookies")
        .field(FieldSpec::new("session_id", ParamType::String))
        .field(FieldSpec::new("tracker", ParamType::String).optional())
        .extra(ExtraPolicy::Forbid)
}

pub(super) fn read_cookies() -> Result<Endpoint, SpecError> {
    Endpoint::builder("read_cookies")
        .param(ParameterSpec::cookie("cookies", ParamType::object(cookies_model())))
        .build()
}

pub(super) fn schedule_item() -> Result<Endpoint, SpecError> {
    Endpoint::builder("schedule_item")
        .param(ParameterSpec::path("item_id", ParamType::Uuid))
        .param(ParameterSpec::body("start_datetime", ParamType::DateTime))
        .param(ParameterSpec::body("end_datetime", ParamType::DateTime))
        .param(ParameterSpec::body("process_after", ParamType::Duration))
        .param(ParameterSpec::body("repeat_at", ParamType::Time).optional())
        .build()
}

pub(super) fn tag_set() -> Result<Endpoint, SpecError> {
    Endpoint::builder("tag_set")
        .param(ParameterSpec::query("tags", ParamType::set(ParamType::String)))
        .build()
}
