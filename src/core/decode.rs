//! Purpose: Recursive decoding of tagged attribute-value wrappers into plain JSON.
//! Exports: `TypeTag`, `ErrorPolicy`, `DecodeConfig`, `DecodeOutcome`, `FieldSkip`, `decode_record`.
//! Role: Decode engine used by the CLI; isolates dispatch and recursion from main.
//! Invariants: Multi-tag wrappers resolve by fixed precedence, never map iteration order.
//! Invariants: Skip mode only omits the failing field; siblings keep decoding.
//! Invariants: Map values and list elements share one dispatch routine.
use serde_json::{Map, Value};

use crate::core::classify::{Shape, classify};
use crate::core::error::{Error, ErrorKind};
use crate::core::key::sanitize_key;
use crate::core::scalar::{parse_boolean, parse_null_flag, parse_number, parse_string};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum TypeTag {
    String,
    Number,
    Boolean,
    NullFlag,
    List,
    Map,
}

impl TypeTag {
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "S" => Some(TypeTag::String),
            "N" => Some(TypeTag::Number),
            "BOOL" => Some(TypeTag::Boolean),
            "NULL" => Some(TypeTag::NullFlag),
            "L" => Some(TypeTag::List),
            "M" => Some(TypeTag::Map),
            _ => None,
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            TypeTag::String => "S",
            TypeTag::Number => "N",
            TypeTag::Boolean => "BOOL",
            TypeTag::NullFlag => "NULL",
            TypeTag::List => "L",
            TypeTag::Map => "M",
        }
    }

    // Lower wins when a wrapper carries more than one recognized tag.
    fn precedence(self) -> u8 {
        match self {
            TypeTag::String => 0,
            TypeTag::Number => 1,
            TypeTag::Boolean => 2,
            TypeTag::NullFlag => 3,
            TypeTag::List => 4,
            TypeTag::Map => 5,
        }
    }

    pub fn expected_shape(self) -> Shape {
        match self {
            TypeTag::String | TypeTag::Number | TypeTag::Boolean | TypeTag::NullFlag => {
                Shape::String
            }
            TypeTag::List => Shape::List,
            TypeTag::Map => Shape::Map,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorPolicy {
    Skip,
    Stop,
}

#[derive(Copy, Clone, Debug)]
pub struct DecodeConfig {
    pub errors: ErrorPolicy,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            errors: ErrorPolicy::Skip,
        }
    }
}

/// Outer-record counts. `fields_total` and `decoded` cover top-level fields
/// only; `skipped` counts skip events at any depth. A field can be omitted
/// without a skip (`NULL` false, empty list or map), so the counts need not
/// sum.
#[derive(Copy, Clone, Debug, Default)]
pub struct DecodeOutcome {
    pub fields_total: u64,
    pub decoded: u64,
    pub skipped: u64,
}

#[derive(Clone, Debug)]
pub struct FieldSkip {
    pub path: String,
    pub tag: Option<&'static str>,
    pub kind: ErrorKind,
    pub message: String,
    pub token: Option<String>,
}

struct Ctx<'a, N: FnMut(FieldSkip)> {
    policy: ErrorPolicy,
    on_skip: &'a mut N,
    skipped: u64,
}

impl<N: FnMut(FieldSkip)> Ctx<'_, N> {
    /// Convert a field-level failure into a skip notice or a fatal error,
    /// depending on policy. Called exactly once, where the failure is first
    /// detected; bubbled stop-mode errors pass through unchanged.
    fn handle(&mut self, path: &str, tag: Option<TypeTag>, err: Error) -> Result<(), Error> {
        match self.policy {
            ErrorPolicy::Stop => {
                let mut err = err;
                if err.field().is_none() {
                    err = err.with_field(if path.is_empty() { "<record>" } else { path });
                }
                if err.tag().is_none() {
                    if let Some(tag) = tag {
                        err = err.with_tag(tag.key());
                    }
                }
                Err(err)
            }
            ErrorPolicy::Skip => {
                self.skipped += 1;
                (self.on_skip)(FieldSkip {
                    path: path.to_string(),
                    tag: tag.map(TypeTag::key),
                    kind: err.kind(),
                    message: err.message().unwrap_or("decode failed").to_string(),
                    token: err.token().map(str::to_string),
                });
                Ok(())
            }
        }
    }
}

/// Decode a whole record: one map decode over the document with per-field
/// skip semantics. Under `ErrorPolicy::Skip` this never fails; under
/// `ErrorPolicy::Stop` the first field-level error aborts the decode.
pub fn decode_record<N: FnMut(FieldSkip)>(
    record: &Map<String, Value>,
    config: DecodeConfig,
    mut on_skip: N,
) -> Result<(Map<String, Value>, DecodeOutcome), Error> {
    let mut ctx = Ctx {
        policy: config.errors,
        on_skip: &mut on_skip,
        skipped: 0,
    };
    let decoded = decode_map(record, "", &mut ctx)?;
    let outcome = DecodeOutcome {
        fields_total: record.len() as u64,
        decoded: decoded.len() as u64,
        skipped: ctx.skipped,
    };
    Ok((decoded, outcome))
}

fn join_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}.{name}")
    }
}

fn decode_map<N: FnMut(FieldSkip)>(
    fields: &Map<String, Value>,
    path: &str,
    ctx: &mut Ctx<'_, N>,
) -> Result<Map<String, Value>, Error> {
    let mut out = Map::new();
    for (raw_name, wrapper) in fields {
        let name = match sanitize_key(raw_name) {
            Ok(name) => name,
            Err(err) => {
                ctx.handle(path, None, err)?;
                continue;
            }
        };
        let child_path = join_path(path, name);
        if let Some(value) = decode_field(wrapper, &child_path, ctx)? {
            out.insert(name.to_string(), value);
        }
    }
    Ok(out)
}

fn decode_list<N: FnMut(FieldSkip)>(
    items: &[Value],
    path: &str,
    ctx: &mut Ctx<'_, N>,
) -> Result<Vec<Value>, Error> {
    let mut out = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        if classify(item) != Shape::Map {
            return Err(Error::new(ErrorKind::InvalidList).with_message(format!(
                "list element {index} is not a tagged wrapper (found {})",
                classify(item).label()
            )));
        }
        let child_path = format!("{path}[{index}]");
        if let Some(value) = decode_field(item, &child_path, ctx)? {
            out.push(value);
        }
    }
    Ok(out)
}

/// Decode one tagged wrapper. `Ok(None)` means the field is omitted: a
/// handled skip, a false `NULL` flag, or an empty composite after filtering.
fn decode_field<N: FnMut(FieldSkip)>(
    wrapper: &Value,
    path: &str,
    ctx: &mut Ctx<'_, N>,
) -> Result<Option<Value>, Error> {
    let Value::Object(entries) = wrapper else {
        let err = Error::new(ErrorKind::TypeMismatch).with_message(format!(
            "field wrapper must be an object, found {}",
            classify(wrapper).label()
        ));
        ctx.handle(path, None, err)?;
        return Ok(None);
    };

    let Some((tag, payload)) = resolve_tag(entries, path, ctx)? else {
        return Ok(None);
    };

    let shape = classify(payload);
    if shape != tag.expected_shape() {
        let err = Error::new(ErrorKind::TypeMismatch).with_message(format!(
            "tag {} expects a {} payload, found {}",
            tag.key(),
            tag.expected_shape().label(),
            shape.label()
        ));
        ctx.handle(path, Some(tag), err)?;
        return Ok(None);
    }

    match decode_payload(tag, payload, path, ctx) {
        Ok(value) => Ok(value),
        Err(err) => {
            ctx.handle(path, Some(tag), err)?;
            Ok(None)
        }
    }
}

/// Pick the wrapper's effective tag. With several recognized tags present the
/// fixed precedence order decides; unrecognized keys are ignored unless no
/// recognized tag exists at all.
fn resolve_tag<'v, N: FnMut(FieldSkip)>(
    entries: &'v Map<String, Value>,
    path: &str,
    ctx: &mut Ctx<'_, N>,
) -> Result<Option<(TypeTag, &'v Value)>, Error> {
    let mut best: Option<(TypeTag, &Value)> = None;
    for (raw_tag, payload) in entries {
        let tag_key = match sanitize_key(raw_tag) {
            Ok(tag_key) => tag_key,
            Err(err) => {
                ctx.handle(path, None, err.with_message("type tag is empty after trimming"))?;
                continue;
            }
        };
        let Some(tag) = TypeTag::from_key(tag_key) else {
            continue;
        };
        match best {
            Some((current, _)) if current.precedence() <= tag.precedence() => {}
            _ => best = Some((tag, payload)),
        }
    }
    if best.is_none() {
        let err =
            Error::new(ErrorKind::UnknownTag).with_message("wrapper carries no recognized type tag");
        ctx.handle(path, None, err)?;
    }
    Ok(best)
}

fn decode_payload<N: FnMut(FieldSkip)>(
    tag: TypeTag,
    payload: &Value,
    path: &str,
    ctx: &mut Ctx<'_, N>,
) -> Result<Option<Value>, Error> {
    match (tag, payload) {
        (TypeTag::String, Value::String(raw)) => parse_string(raw).map(Some),
        (TypeTag::Number, Value::String(raw)) => parse_number(raw).map(Some),
        (TypeTag::Boolean, Value::String(raw)) => {
            parse_boolean(raw).map(|flag| Some(Value::Bool(flag)))
        }
        (TypeTag::NullFlag, Value::String(raw)) => {
            Ok(parse_null_flag(raw)?.then(|| Value::Bool(true)))
        }
        (TypeTag::List, Value::Array(items)) => {
            let decoded = decode_list(items, path, ctx)?;
            Ok((!decoded.is_empty()).then(|| Value::Array(decoded)))
        }
        (TypeTag::Map, Value::Object(fields)) => {
            let decoded = decode_map(fields, path, ctx)?;
            Ok((!decoded.is_empty()).then(|| Value::Object(decoded)))
        }
        _ => Err(Error::new(ErrorKind::Internal)
            .with_message("payload shape changed between classification and dispatch")),
    }
}

#[cfg(test)]
mod tests {
    use super::{DecodeConfig, ErrorPolicy, FieldSkip, TypeTag, decode_record};
    use crate::core::error::ErrorKind;
    use serde_json::{Map, Value, json};

    fn record(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("test record must be an object, got {other}"),
        }
    }

    fn decode_collecting(value: Value) -> (Map<String, Value>, Vec<FieldSkip>) {
        let mut skips = Vec::new();
        let (decoded, _) = decode_record(&record(value), DecodeConfig::default(), |skip| {
            skips.push(skip)
        })
        .expect("skip policy never fails");
        (decoded, skips)
    }

    #[test]
    fn scalar_fields_decode_by_tag() {
        let (decoded, skips) = decode_collecting(json!({
            "name": {"S": "deepset"},
            "age": {"N": "31"},
            "ratio": {"N": "0.25"},
            "active": {"BOOL": "true"},
        }));
        assert_eq!(
            Value::Object(decoded),
            json!({"name": "deepset", "age": 31, "ratio": 0.25, "active": true})
        );
        assert!(skips.is_empty());
    }

    #[test]
    fn nested_map_round_trip() {
        let (decoded, skips) = decode_collecting(json!({
            "a": {"M": {"b": {"N": "5"}}},
        }));
        assert_eq!(Value::Object(decoded), json!({"a": {"b": 5}}));
        assert!(skips.is_empty());
    }

    #[test]
    fn deeply_nested_composites_decode_recursively() {
        let (decoded, _) = decode_collecting(json!({
            "outer": {"M": {
                "list": {"L": [
                    {"S": "first"},
                    {"M": {"n": {"N": "2"}}},
                    {"L": [{"BOOL": "f"}]},
                ]},
            }},
        }));
        assert_eq!(
            Value::Object(decoded),
            json!({"outer": {"list": ["first", {"n": 2}, [false]]}})
        );
    }

    #[test]
    fn null_flag_true_is_kept_false_is_omitted() {
        let (decoded, skips) = decode_collecting(json!({
            "keep": {"NULL": "true"},
            "drop": {"NULL": "false"},
        }));
        assert_eq!(Value::Object(decoded), json!({"keep": true}));
        assert!(skips.is_empty());
    }

    #[test]
    fn null_flag_junk_is_skipped_with_notice() {
        let (decoded, skips) = decode_collecting(json!({
            "flag": {"NULL": "maybe"},
        }));
        assert!(decoded.is_empty());
        assert_eq!(skips.len(), 1);
        assert_eq!(skips[0].kind, ErrorKind::InvalidBoolean);
        assert_eq!(skips[0].path, "flag");
        assert_eq!(skips[0].tag, Some("NULL"));
        assert_eq!(skips[0].token.as_deref(), Some("maybe"));
    }

    #[test]
    fn empty_composites_are_omitted_from_parent() {
        let (decoded, _) = decode_collecting(json!({
            "empty_list": {"L": []},
            "empty_map": {"M": {}},
            "all_filtered": {"M": {"gone": {"NULL": "false"}}},
            "kept": {"S": "v"},
        }));
        assert_eq!(Value::Object(decoded), json!({"kept": "v"}));
    }

    #[test]
    fn multi_tag_wrapper_resolves_by_precedence() {
        // S outranks N regardless of key order in the JSON text.
        let (decoded, skips) = decode_collecting(json!({
            "x": {"N": "5", "S": "hello"},
            "y": {"M": {"inner": {"S": "v"}}, "BOOL": "true"},
        }));
        assert_eq!(Value::Object(decoded), json!({"x": "hello", "y": true}));
        assert!(skips.is_empty());
    }

    #[test]
    fn tag_payload_mismatch_is_skipped() {
        let (decoded, skips) = decode_collecting(json!({
            "bad": {"N": ["1"]},
            "good": {"N": "1"},
        }));
        assert_eq!(Value::Object(decoded), json!({"good": 1}));
        assert_eq!(skips.len(), 1);
        assert_eq!(skips[0].kind, ErrorKind::TypeMismatch);
        assert_eq!(skips[0].path, "bad");
        assert_eq!(skips[0].tag, Some("N"));
    }

    #[test]
    fn non_object_wrapper_is_skipped() {
        let (decoded, skips) = decode_collecting(json!({
            "bad": 5,
            "good": {"S": "v"},
        }));
        assert_eq!(Value::Object(decoded), json!({"good": "v"}));
        assert_eq!(skips.len(), 1);
        assert_eq!(skips[0].kind, ErrorKind::TypeMismatch);
        assert_eq!(skips[0].path, "bad");
    }

    #[test]
    fn unknown_tag_is_skipped_with_notice() {
        let (decoded, skips) = decode_collecting(json!({
            "x": {"Q": "v"},
            "empty": {},
        }));
        assert!(decoded.is_empty());
        assert_eq!(skips.len(), 2);
        assert!(skips.iter().all(|skip| skip.kind == ErrorKind::UnknownTag));
    }

    #[test]
    fn blank_field_names_and_tags_are_skipped() {
        let (decoded, skips) = decode_collecting(json!({
            "  ": {"S": "lost"},
            " name ": {"S": "kept"},
        }));
        assert_eq!(Value::Object(decoded), json!({"name": "kept"}));
        // Blank outer key: one EmptyKey skip against the parent path.
        assert_eq!(skips.len(), 1);
        assert_eq!(skips[0].kind, ErrorKind::EmptyKey);
        assert_eq!(skips[0].path, "");
    }

    #[test]
    fn whitespace_around_tags_is_trimmed() {
        let (decoded, skips) = decode_collecting(json!({
            "x": {" S ": "v"},
        }));
        assert_eq!(Value::Object(decoded), json!({"x": "v"}));
        assert!(skips.is_empty());
    }

    #[test]
    fn non_wrapper_list_element_fails_the_whole_list() {
        let (decoded, skips) = decode_collecting(json!({
            "x": {"L": [{"S": "a"}, 5]},
            "y": {"S": "kept"},
        }));
        assert_eq!(Value::Object(decoded), json!({"y": "kept"}));
        assert_eq!(skips.len(), 1);
        assert_eq!(skips[0].kind, ErrorKind::InvalidList);
        assert_eq!(skips[0].path, "x");
        assert_eq!(skips[0].tag, Some("L"));
    }

    #[test]
    fn failed_list_elements_are_skipped_individually() {
        let (decoded, skips) = decode_collecting(json!({
            "x": {"L": [{"S": "a"}, {"N": "12a"}, {"S": "b"}]},
        }));
        assert_eq!(Value::Object(decoded), json!({"x": ["a", "b"]}));
        assert_eq!(skips.len(), 1);
        assert_eq!(skips[0].path, "x[1]");
        assert_eq!(skips[0].kind, ErrorKind::InvalidNumber);
    }

    #[test]
    fn skip_paths_reach_into_nested_maps() {
        let (decoded, skips) = decode_collecting(json!({
            "profile": {"M": {
                "age": {"N": "12a"},
                "name": {"S": "ada"},
            }},
        }));
        assert_eq!(Value::Object(decoded), json!({"profile": {"name": "ada"}}));
        assert_eq!(skips.len(), 1);
        assert_eq!(skips[0].path, "profile.age");
        assert_eq!(skips[0].token.as_deref(), Some("12a"));
    }

    #[test]
    fn timestamp_strings_decode_to_epoch_inside_composites() {
        let (decoded, _) = decode_collecting(json!({
            "seen": {"M": {"at": {"S": "2014-07-16T20:55:46Z"}}},
        }));
        assert_eq!(Value::Object(decoded), json!({"seen": {"at": 1405544146}}));
    }

    #[test]
    fn outcome_counts_outer_fields_and_skip_events() {
        let mut skips = Vec::new();
        let (_, outcome) = decode_record(
            &record(json!({
                "ok": {"S": "v"},
                "bad": {"N": "12a"},
                "nested": {"M": {"inner_bad": {"BOOL": "yes"}, "inner_ok": {"N": "1"}}},
                "dropped": {"NULL": "false"},
            })),
            DecodeConfig::default(),
            |skip| skips.push(skip),
        )
        .expect("skip policy never fails");
        assert_eq!(outcome.fields_total, 4);
        // "ok" and "nested" decode; "bad" skips; "dropped" is omitted quietly.
        assert_eq!(outcome.decoded, 2);
        assert_eq!(outcome.skipped, 2);
        assert_eq!(skips.len(), 2);
    }

    #[test]
    fn stop_policy_surfaces_the_first_field_error() {
        let err = decode_record(
            &record(json!({"bad": {"N": "12a"}})),
            DecodeConfig {
                errors: ErrorPolicy::Stop,
            },
            |_| {},
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidNumber);
        assert_eq!(err.field(), Some("bad"));
        assert_eq!(err.tag(), Some("N"));
    }

    #[test]
    fn stop_policy_keeps_the_deepest_field_path() {
        let err = decode_record(
            &record(json!({"outer": {"M": {"inner": {"S": "   "}}}})),
            DecodeConfig {
                errors: ErrorPolicy::Stop,
            },
            |_| {},
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::EmptyString);
        assert_eq!(err.field(), Some("outer.inner"));
    }

    #[test]
    fn tag_precedence_is_the_documented_order() {
        let order = [
            TypeTag::String,
            TypeTag::Number,
            TypeTag::Boolean,
            TypeTag::NullFlag,
            TypeTag::List,
            TypeTag::Map,
        ];
        for pair in order.windows(2) {
            assert!(pair[0].precedence() < pair[1].precedence());
        }
    }
}
