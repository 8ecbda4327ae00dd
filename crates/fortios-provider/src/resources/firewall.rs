use fortios_schema::{Attribute, ResourceSchema, TableSchema};

pub(super) fn vipgrp64() -> ResourceSchema {
    ResourceSchema::collection("firewall_vipgrp64", "firewall/vipgrp64", "name")
        .describe("IPv6 to IPv4 virtual IP groups")
        .vdom_scoped()
        .with(Attribute::string("name").len_between(0, 79).force_new().computed())
        .with(Attribute::string("uuid").uuid().computed())
        .with(Attribute::int("color").int_between(0, 32).computed())
        .with(Attribute::string("comments").len_between(0, 255))
        .with(
            Attribute::table(
                "member",
                TableSchema::set(vec![Attribute::string("name").len_between(0, 79)])
                    .sorted_by("name"),
            )
            .required(),
        )
        .with_table_controls()
}

pub(super) fn internet_service_extension() -> ResourceSchema {
    let port_range = TableSchema::list(vec![
        Attribute::int("id"),
        Attribute::int("start_port").int_between(0, 65535),
        Attribute::int("end_port").int_between(0, 65535),
    ])
    .sorted_by("id");

    let dst = TableSchema::set(vec![Attribute::string("name").len_between(0, 79)])
        .sorted_by("name");

    let entry = TableSchema::list(vec![
        Attribute::int("id"),
        Attribute::int("protocol").int_between(0, 255),
        Attribute::table("port_range", port_range),
        Attribute::table("dst", dst),
    ])
    .sorted_by("id");

    ResourceSchema::collection(
        "firewall_internetserviceextension",
        "firewall/internet-service-extension",
        "fosid",
    )
    .describe("Internet Service extension entries")
    .vdom_scoped()
    .with(Attribute::int("fosid").wire("id").computed().force_new())
    .with(Attribute::string("comment").len_between(0, 255))
    .with(Attribute::table("entry", entry))
    .with_table_controls()
}

pub(super) fn ssh_local_key() -> ResourceSchema {
    ResourceSchema::collection("firewallssh_localkey", "firewall.ssh/local-key", "name")
        .describe("SSH proxy local keys")
        .with(Attribute::string("name").len_between(0, 35).force_new())
        .with(Attribute::string("password").len_between(0, 128).sensitive())
        .with(Attribute::string("private_key").required().sensitive())
        .with(Attribute::string("public_key").required().sensitive())
        .with(Attribute::string("source").computed())
}
