// (c) Copyright 2025 Helsing GmbH. All rights reserved.
/// Convenience macro for creating a [`Model`](crate::Model) from a JSON object
/// literal.
///
/// Accepts the same syntax as [`serde_json::json!`], including interpolated
/// expressions.
///
/// ```rust
/// # use meditor::model;
/// let name = "Brain atlas";
/// let model = model!({
///     "name": name,
///     "keywords": ["mouse", "brain"],
///     "contributor": [{"name": "Doe, Jane"}]
/// });
/// assert_eq!(model["keywords"][1], "brain");
/// ```
///
/// NOTE! Panics if the literal is not an object, so this is mostly useful for
/// tests and initialization.
#[macro_export]
macro_rules! model {
    ($($json:tt)+) => {
        match $crate::serde_json::json!($($json)+) {
            $crate::serde_json::Value::Object(map) => map,
            other => panic!("model! expects a JSON object, got {other}"),
        }
    };
}
