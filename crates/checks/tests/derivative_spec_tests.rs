//! Derivative comparison against realistic live objects.
//!
//! A live Deployment or Service carries plenty of fields the operator never
//! sets (cluster defaults, assigned IPs). These tests serialize the expected
//! templates, graft such fields on top the way an API server would, and
//! verify that the comparison tolerates them while still catching real
//! divergence.

use serde_json::{json, Value};

use pulp_checks::derivative;
use pulp_checks::workloads::{expected_deployment_spec, expected_service_spec, Workload};

/// Expected deployment spec plus the fields a live API server would add.
fn live_deployment_spec(workload: Workload, instance: &str) -> Value {
    let mut live = serde_json::to_value(expected_deployment_spec(workload, instance))
        .expect("serialize template");

    live["progressDeadlineSeconds"] = json!(600);
    live["revisionHistoryLimit"] = json!(10);
    live["strategy"] = json!({"type": "RollingUpdate"});
    live["selector"] = json!({"matchLabels": {"app.kubernetes.io/component": workload.suffix()}});

    let pod_spec = &mut live["template"]["spec"];
    pod_spec["dnsPolicy"] = json!("ClusterFirst");
    pod_spec["restartPolicy"] = json!("Always");
    pod_spec["schedulerName"] = json!("default-scheduler");

    let container = &mut pod_spec["containers"][0];
    container["imagePullPolicy"] = json!("IfNotPresent");
    container["terminationMessagePath"] = json!("/dev/termination-log");
    container["resources"] = json!({});

    live
}

fn live_service_spec(workload: Workload, instance: &str, deployment_type: &str) -> Value {
    let mut live = serde_json::to_value(expected_service_spec(workload, instance, deployment_type))
        .expect("serialize template");

    live["clusterIP"] = json!("172.30.81.149");
    live["clusterIPs"] = json!(["172.30.81.149"]);
    live["ipFamilies"] = json!(["IPv4"]);
    live["sessionAffinity"] = json!("None");

    live
}

#[test]
fn live_deployment_with_cluster_defaults_matches() {
    for workload in Workload::ALL {
        let expected =
            serde_json::to_value(expected_deployment_spec(workload, "ocp-example")).expect("serialize");
        let live = live_deployment_spec(workload, "ocp-example");
        assert!(
            derivative::matches(&expected, &live),
            "expected {workload:?} deployment template to match its live form"
        );
    }
}

#[test]
fn live_service_with_assigned_ips_matches() {
    for workload in Workload::ALL {
        let expected = serde_json::to_value(expected_service_spec(workload, "ocp-example", "pulp"))
            .expect("serialize");
        let live = live_service_spec(workload, "ocp-example", "pulp");
        assert!(
            derivative::matches(&expected, &live),
            "expected {workload:?} service template to match its live form"
        );
    }
}

#[test]
fn a_changed_container_port_is_caught_with_its_path() {
    let expected =
        serde_json::to_value(expected_deployment_spec(Workload::Api, "ocp-example")).expect("serialize");
    let mut live = live_deployment_spec(Workload::Api, "ocp-example");
    live["template"]["spec"]["containers"][0]["ports"][0]["containerPort"] = json!(8080);

    let mismatches = derivative::mismatches(&expected, &live);
    assert_eq!(mismatches.len(), 1);
    assert_eq!(
        mismatches[0].path,
        "/template/spec/containers/0/ports/0/containerPort"
    );
}

#[test]
fn a_dropped_volume_is_caught_as_a_length_mismatch() {
    let expected =
        serde_json::to_value(expected_deployment_spec(Workload::Api, "ocp-example")).expect("serialize");
    let mut live = live_deployment_spec(Workload::Api, "ocp-example");
    live["template"]["spec"]["volumes"]
        .as_array_mut()
        .expect("volumes")
        .pop();

    let mismatches = derivative::mismatches(&expected, &live);
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].path, "/template/spec/volumes");
}

#[test]
fn a_missing_env_entry_fails_even_when_everything_else_matches() {
    let expected =
        serde_json::to_value(expected_deployment_spec(Workload::Content, "ocp-example"))
            .expect("serialize");
    let mut live = live_deployment_spec(Workload::Content, "ocp-example");
    live["template"]["spec"]["containers"][0]["env"]
        .as_array_mut()
        .expect("env")
        .remove(4);

    assert!(!derivative::matches(&expected, &live));
}

#[test]
fn a_wrong_selector_label_is_caught_on_the_service() {
    let expected = serde_json::to_value(expected_service_spec(Workload::Api, "ocp-example", "pulp"))
        .expect("serialize");
    let mut live = live_service_spec(Workload::Api, "ocp-example", "pulp");
    live["selector"]["app.kubernetes.io/managed-by"] = json!("helm");

    let mismatches = derivative::mismatches(&expected, &live);
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].path, "/selector/app.kubernetes.io/managed-by");
}
