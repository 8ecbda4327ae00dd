use fortios_schema::{Attribute, DeleteBehavior, ResourceSchema, TableSchema};

pub(super) fn fortianalyzer3_override_setting() -> ResourceSchema {
    ResourceSchema::settings(
        "logfortianalyzer3_overridesetting",
        "log.fortianalyzer3/override-setting",
        DeleteBehavior::Reset,
    )
    .describe("Override FortiAnalyzer settings for the third log server")
    .vdom_scoped()
    .with(Attribute::string("override"))
    .with(Attribute::string("use_management_vdom").computed())
    .with(Attribute::string("status").computed())
    .with(Attribute::string("ips_archive").computed())
    .with(Attribute::string("server").len_between(0, 127))
    .with(Attribute::string("alt_server").len_between(0, 127))
    .with(Attribute::string("fallback_to_primary").computed())
    .with(Attribute::string("certificate_verification").computed())
    .with(Attribute::table(
        "serial",
        TableSchema::set(vec![Attribute::string("name").len_between(0, 79)]).sorted_by("name"),
    ))
    .with(Attribute::string("server_cert_ca").len_between(0, 79))
    .with(Attribute::string("preshared_key").len_between(0, 63))
    .with(Attribute::string("access_config").computed())
    .with(Attribute::string("hmac_algorithm").computed())
    .with(Attribute::string("enc_algorithm").computed())
    .with(Attribute::string("ssl_min_proto_version").computed())
    .with(Attribute::int("conn_timeout").int_between(1, 3600).computed())
    .with(Attribute::int("monitor_keepalive_period").int_between(1, 120).computed())
    .with(Attribute::int("monitor_failure_retry_period").int_between(1, 86400).computed())
    .with(Attribute::string("mgmt_name").len_between(0, 35).computed())
    .with(Attribute::int("faz_type"))
    .with(Attribute::string("certificate").len_between(0, 35))
    .with(Attribute::string("source_ip").len_between(0, 63))
    .with(Attribute::int("__change_ip").wire("__change_ip").int_between(0, 255))
    .with(Attribute::string("upload_option").computed())
    .with(Attribute::string("upload_interval").computed())
    .with(Attribute::string("upload_day"))
    .with(Attribute::string("upload_time"))
    .with(Attribute::string("reliable").computed())
    .with(Attribute::string("priority").computed())
    .with(Attribute::int("max_log_rate").int_between(0, 100_000))
    .with(Attribute::string("interface_select_method").computed())
    .with(Attribute::string("interface").len_between(0, 15))
    .with_table_controls()
}

pub(super) fn syslogd4_override_setting() -> ResourceSchema {
    let custom_field_name = TableSchema::list(vec![
        Attribute::int("id").int_between(0, 255),
        Attribute::string("name").len_between(0, 35),
        Attribute::string("custom").len_between(0, 35),
    ])
    .sorted_by("id");

    ResourceSchema::settings(
        "logsyslogd4_overridesetting",
        "log.syslogd4/override-setting",
        DeleteBehavior::Remove,
    )
    .describe("Override settings for the fourth remote syslog server")
    .with(Attribute::string("override"))
    .with(Attribute::string("status"))
    .with(Attribute::string("server").len_between(0, 63))
    .with(Attribute::string("mode"))
    .with(Attribute::int("port").int_between(0, 65535))
    .with(Attribute::string("facility"))
    .with(Attribute::string("source_ip").len_between(0, 63))
    .with(Attribute::string("format"))
    .with(Attribute::string("enc_algorithm"))
    .with(Attribute::string("ssl_min_proto_version"))
    .with(Attribute::string("certificate").len_between(0, 35))
    .with(Attribute::table("custom_field_name", custom_field_name))
    .with(Attribute::int("syslog_type"))
}

const MEMORY_FILTER_SWITCHES: &[&str] = &[
    "severity",
    "forward_traffic",
    "local_traffic",
    "multicast_traffic",
    "sniffer_traffic",
    "anomaly",
    "netscan_discovery",
    "netscan_vulnerability",
    "voip",
    "gtp",
    "dns",
    "ssh",
    "event",
    "system",
    "radius",
    "ipsec",
    "dhcp",
    "ppp",
    "admin",
    "ha",
    "auth",
    "pattern",
    "sslvpn_log_auth",
    "sslvpn_log_adm",
    "sslvpn_log_session",
    "vip_ssl",
    "ldb_monitor",
    "wan_opt",
    "wireless_activity",
    "cpu_memory_usage",
];

pub(super) fn memory_filter() -> ResourceSchema {
    let schema = ResourceSchema::settings("logmemory_filter", "log.memory/filter", DeleteBehavior::Forget)
        .describe("Filters for memory buffer logging");

    MEMORY_FILTER_SWITCHES
        .iter()
        .copied()
        .fold(schema, |schema, name| schema.with(Attribute::string(name).computed()))
        .with(Attribute::string("filter").len_between(0, 511))
        .with(Attribute::string("filter_type"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fortios_schema::{build_object, BuildMode, ResourceState};
    use serde_json::json;

    #[test]
    fn change_ip_keeps_its_underscores_on_the_wire() {
        let schema = fortianalyzer3_override_setting();
        let attr = schema.attribute("__change_ip").unwrap();
        assert_eq!(attr.wire_key, "__change_ip");
        assert_eq!(schema.attribute("conn_timeout").unwrap().wire_key, "conn-timeout");
    }

    #[test]
    fn reset_clears_every_held_attribute() {
        let schema = fortianalyzer3_override_setting();
        let mut state = ResourceState::new();
        state.set("status", "disable");
        state.set("conn_timeout", 10_i64);
        state.set("vdomparam", "root");

        let object = build_object(&schema, &state, None, BuildMode::Clear).unwrap();
        assert_eq!(object.len(), 2);
        assert_eq!(object["status"], json!(null));
        assert_eq!(object["conn-timeout"], json!(null));
    }

    #[test]
    fn syslog_port_is_range_checked() {
        let schema = syslogd4_override_setting();
        let mut state = ResourceState::new();
        state.set("port", 70_000_i64);
        assert!(schema.validate(&state).is_err());
        assert!(!schema.is_vdom_scoped());
    }

    #[test]
    fn memory_filter_declares_every_switch() {
        let schema = memory_filter();
        for name in MEMORY_FILTER_SWITCHES {
            assert!(schema.attribute(name).unwrap().computed, "{name}");
        }
        assert_eq!(schema.attribute("cpu_memory_usage").unwrap().wire_key, "cpu-memory-usage");
    }
}
