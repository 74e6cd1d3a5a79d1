/*!
Known token tables.

Two fixed name tables drive exact matching and typo correction:
  - SUBCOMMANDS (verbs kubectl accepts as its first argument)
  - RESOURCES   (resource kinds: plural, singular and short names)

Declaration order matters: similarity scans walk the tables front to back,
and tied suggestions are reported in this order.

Helpers:
  - is_subcommand()
  - is_resource()
  - requires_confirmation()
*/

/// Subcommands understood by the real tool.
pub static SUBCOMMANDS: &[&str] = &[
    "create",
    "expose",
    "run",
    "run-container",
    "set",
    "get",
    "explain",
    "edit",
    "delete",
    "rollout",
    "rolling-update",
    "rollingupdate",
    "scale",
    "resize",
    "autoscale",
    "certificate",
    "cluster-info",
    "clusterinfo",
    "top",
    "cordon",
    "uncordon",
    "drain",
    "taint",
    "describe",
    "logs",
    "attach",
    "exec",
    "port-forward",
    "proxy",
    "cp",
    "auth",
    "apply",
    "patch",
    "replace",
    "update",
    "convert",
    "label",
    "annotate",
    "completion",
    "api-versions",
    "config",
    "help",
    "plugin",
    "version",
];

/// Resource kinds with their singular and short aliases.
#[rustfmt::skip]
pub static RESOURCES: &[&str] = &[
    "all",
    "certificatesigningrequests", "certificatesigningrequest", "csr",
    "clusterrolebindings", "clusterrolebinding",
    "clusterroles", "clusterrole",
    "clusters", "cluster",
    "componentstatuses", "componentstatus", "cs",
    "configmaps", "configmap", "cm",
    "controllerrevisions", "controllerrevision",
    "cronjobs", "cronjob",
    "daemonsets", "daemonset", "ds",
    "deployments", "deployment", "deploy",
    "endpoints", "endpoint", "ep",
    "events", "event", "ev",
    "horizontalpodautoscalers", "horizontalpodautoscaler", "hpa",
    "ingresses", "ingress", "ing",
    "jobs", "job",
    "limitranges", "limitrange", "limits",
    "namespaces", "namespace", "ns",
    "networkpolicies", "networkpolicy", "netpol",
    "nodes", "node", "no",
    "persistentvolumeclaims", "persistentvolumeclaim", "pvc",
    "persistentvolumes", "persistentvolume", "pv",
    "poddisruptionbudgets", "poddisruptionbudget", "pdb",
    "podpreset",
    "pods", "pod", "po",
    "podsecuritypolicies", "podsecuritypolicy", "psp",
    "podtemplates", "podtemplate",
    "replicasets", "replicaset", "rs",
    "replicationcontrollers", "replicationcontroller", "rc",
    "resourcequotas", "resourcequota", "quota",
    "rolebindings", "rolebinding",
    "roles", "role",
    "secrets", "secret",
    "serviceaccounts", "serviceaccount", "sa",
    "services", "service", "svc",
    "statefulsets", "statefulset",
    "storageclasses", "storageclass",
    "thirdpartyresources", "thirdpartyresource",
];

/// Subcommands that mutate the cluster and are gated behind a confirmation.
pub static CONFIRM_SUBCOMMANDS: &[&str] = &["apply", "delete"];

pub fn is_subcommand(token: &str) -> bool {
    SUBCOMMANDS.contains(&token)
}

pub fn is_resource(token: &str) -> bool {
    RESOURCES.contains(&token)
}

/// Whether running `args` through the real tool should ask first.
pub fn requires_confirmation(args: &[String]) -> bool {
    args.first()
        .is_some_and(|first| CONFIRM_SUBCOMMANDS.contains(&first.as_str()))
}

/* --------------------------------- Tests ---------------------------------- */
