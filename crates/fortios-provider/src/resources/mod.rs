//! Built-in resource definitions.
//!
//! Each function returns one declarative [`ResourceSchema`]; the engine in
//! `fortios-schema` does the rest.

mod firewall;
mod log;
mod system;
mod virtual_patch;

use fortios_schema::ResourceSchema;

pub(crate) fn builtin() -> Vec<ResourceSchema> {
    vec![
        firewall::vipgrp64(),
        firewall::internet_service_extension(),
        firewall::ssh_local_key(),
        log::fortianalyzer3_override_setting(),
        log::syslogd4_override_setting(),
        log::memory_filter(),
        system::replacemsg_auth(),
        system::replacemsg_mail(),
        system::replacemsg_fortiguard_wf(),
        virtual_patch::profile(),
    ]
}
