use fortios_core::DeviceVersion;
use fortios_schema::{Attribute, ResourceSchema, TableSchema};

pub(super) fn profile() -> ResourceSchema {
    let rule = TableSchema::set(vec![Attribute::int("id")]).sorted_by("id");
    let device = TableSchema::set(vec![Attribute::string("mac")]).sorted_by("mac");
    let exemption = TableSchema::list(vec![
        Attribute::int("id"),
        Attribute::string("status").computed(),
        Attribute::table("rule", rule),
        Attribute::table("device", device),
    ])
    .sorted_by("id");

    ResourceSchema::collection("virtualpatch_profile", "virtual-patch/profile", "name")
        .describe("Virtual patch profiles")
        .since(DeviceVersion::new(7, 4, 1))
        .vdom_scoped()
        .with(Attribute::string("name").len_between(0, 35).force_new().computed())
        .with(Attribute::string("comment").len_between(0, 255))
        .with(Attribute::string("severity").computed())
        .with(Attribute::string("action").computed())
        .with(Attribute::string("log").computed())
        .with(Attribute::table("exemption", exemption))
        .with_table_controls()
}
