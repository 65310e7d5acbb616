//! Startup discovery: load the capability file, classify every endpoint,
//! and ask the robot which argument values are currently legal for each
//! actuating endpoint. Runs once per client construction and on explicit
//! re-invocation.

use log::{info, warn};

use super::store::CapabilityStore;
use super::types::{action_of, CapabilityTable, EndpointKind, API_PREFIX};
use crate::error::ClientResult;
use crate::protocol::{ResponsePayload, Transceiver};

/// Continuous-range motion endpoints. These accept arbitrary floats, so
/// there is no legal-value set to enumerate.
const CONTINUOUS_AXES: [&str; 3] = ["MoveX", "MoveY", "MoveZ"];

/// Partition the store's endpoints into the three-way capability table.
/// Enumerations start out unresolved; [`run`] fills them in.
pub fn classify(store: &CapabilityStore) -> CapabilityTable {
    let mut table = CapabilityTable::default();
    for record in store.endpoints() {
        match record.effective_kind() {
            Some(EndpointKind::Get) => table.get.push(record.api.clone()),
            Some(EndpointKind::Do) => {
                table.do_args.insert(record.api.clone(), None);
            }
            Some(EndpointKind::Connect) => table.connect.push(record.api.clone()),
            None => warn!("skipping unclassifiable endpoint {}", record.api),
        }
    }
    table
}

/// Full discovery pass: classify, then resolve each parameterized `do`
/// endpoint over `link`. One blocking round trip per resolvable endpoint,
/// so latency scales linearly with endpoint count.
pub fn run(store: &CapabilityStore, link: &Transceiver) -> CapabilityTable {
    let mut table = classify(store);
    resolve_with(&mut table, |path| {
        link.send(path)?;
        Ok(link.get_response())
    });
    info!(
        "discovery: {} get, {} do, {} connect endpoints",
        table.get.len(),
        table.do_args.len(),
        table.connect.len()
    );
    table
}

/// Resolve legal-value enumerations through `query`. A failure on one
/// endpoint is logged and leaves that entry unresolved; it never aborts
/// the rest of the pass.
fn resolve_with<F>(table: &mut CapabilityTable, mut query: F)
where
    F: FnMut(&str) -> ClientResult<Option<ResponsePayload>>,
{
    let apis: Vec<String> = table.do_args.keys().cloned().collect();
    for api in apis {
        let Some(path) = enumeration_query_path(&api) else {
            continue;
        };
        match query(&path) {
            Ok(Some(payload)) => {
                table.do_args.insert(api, Some(payload.result));
            }
            Ok(None) => warn!("no response enumerating values for {}", api),
            Err(e) => warn!("failed to enumerate values for {}: {}", api, e),
        }
    }
}

/// Query path for the legal values of a parameterized `do` endpoint: the
/// first parameter name, pluralized, under the `get` segment.
/// `/DoD/do/Move?PositionName={value}` -> `/DoD/get/PositionNames`.
/// Returns `None` for unparameterized templates and the continuous axes.
fn enumeration_query_path(api: &str) -> Option<String> {
    let (base, query) = api.split_once('?')?;
    if CONTINUOUS_AXES.contains(&action_of(base)) {
        return None;
    }
    let parameter = query.split('&').next()?.split('=').next()?;
    if parameter.is_empty() {
        return None;
    }
    Some(format!("{}get/{}s", API_PREFIX, parameter))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn store_with(endpoints: Value) -> (tempfile::TempDir, CapabilityStore) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("capabilities.json");
        std::fs::write(&path, json!({ "endpoints": endpoints }).to_string()).unwrap();
        let store = CapabilityStore::open(&path).unwrap();
        (dir, store)
    }

    #[test]
    fn test_three_way_partition() {
        let (_dir, store) = store_with(json!([
            {"API": "/DoD/get/Status", "args": null, "payload": null},
            {"API": "/DoD/do/Move?PositionName={value}", "args": null, "payload": null},
            {"API": "/DoD/Connect?ClientName={value}", "args": null, "payload": null},
        ]));

        let table = classify(&store);
        assert_eq!(table.get, vec!["/DoD/get/Status"]);
        assert_eq!(
            table.do_args,
            HashMap::from([("/DoD/do/Move?PositionName={value}".to_string(), None)])
        );
        assert_eq!(table.connect, vec!["/DoD/Connect?ClientName={value}"]);
    }

    #[test]
    fn test_explicit_kind_overrides_path() {
        let (_dir, store) = store_with(json!([
            {"API": "/DoD/get/Rinse", "args": null, "payload": null, "kind": "do"},
        ]));
        let table = classify(&store);
        assert!(table.get.is_empty());
        assert!(table.do_args.contains_key("/DoD/get/Rinse"));
    }

    #[test]
    fn test_unclassifiable_endpoints_are_skipped() {
        let (_dir, store) = store_with(json!([
            {"API": "/DoD/Reboot", "args": null, "payload": null},
            {"API": "/DoD/get/Status", "args": null, "payload": null},
        ]));
        let table = classify(&store);
        assert_eq!(table.get, vec!["/DoD/get/Status"]);
        assert!(table.do_args.is_empty());
        assert!(table.connect.is_empty());
    }

    #[test]
    fn test_enumeration_query_path() {
        assert_eq!(
            enumeration_query_path("/DoD/do/Move?PositionName={value}"),
            Some("/DoD/get/PositionNames".to_string())
        );
        assert_eq!(
            enumeration_query_path("/DoD/do/ExecuteTask?TaskName={value}"),
            Some("/DoD/get/TaskNames".to_string())
        );
        // Multi-parameter template: first parameter decides the query.
        assert_eq!(
            enumeration_query_path("/DoD/do/SetNozzleParameters?Voltage={value}&PulseWidth={value}"),
            Some("/DoD/get/Voltages".to_string())
        );
        // Continuous axes have no enumerable value set.
        assert_eq!(enumeration_query_path("/DoD/do/MoveX?Position={value}"), None);
        assert_eq!(enumeration_query_path("/DoD/do/MoveY?Position={value}"), None);
        assert_eq!(enumeration_query_path("/DoD/do/MoveZ?Position={value}"), None);
        // No parameter, nothing to resolve.
        assert_eq!(enumeration_query_path("/DoD/do/ResetError"), None);
    }

    #[test]
    fn test_resolution_failure_is_not_fatal() {
        let mut table = CapabilityTable::default();
        table
            .do_args
            .insert("/DoD/do/Move?PositionName={value}".to_string(), None);
        table
            .do_args
            .insert("/DoD/do/ExecuteTask?TaskName={value}".to_string(), None);

        let reply = ResponsePayload::parse(
            json!({
                "Time": "t",
                "Status": {"Status": "Idle"},
                "LastID": 1,
                "ErrorCode": 0,
                "ErrorMessage": "NA",
                "Result": ["Home", "Waste"],
            })
            .to_string()
            .as_bytes(),
        )
        .unwrap();

        resolve_with(&mut table, |path| {
            if path == "/DoD/get/TaskNames" {
                Err(crate::error::ClientError::MalformedResponse(
                    "truncated".to_string(),
                ))
            } else {
                Ok(Some(reply.clone()))
            }
        });

        assert_eq!(
            table.do_args["/DoD/do/Move?PositionName={value}"],
            Some(json!(["Home", "Waste"]))
        );
        // The failing endpoint stays unresolved instead of aborting the pass.
        assert_eq!(table.do_args["/DoD/do/ExecuteTask?TaskName={value}"], None);
    }
}
