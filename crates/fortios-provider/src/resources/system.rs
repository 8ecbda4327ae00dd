use fortios_schema::{Attribute, ResourceSchema};

fn replacemsg(type_name: &'static str, path: &'static str, description: &'static str) -> ResourceSchema {
    ResourceSchema::collection(type_name, path, "msg_type")
        .describe(description)
        .with(Attribute::string("msg_type").len_between(0, 28).required().force_new())
        .with(Attribute::string("buffer").len_between(0, 32768))
        .with(Attribute::string("header").computed())
        .with(Attribute::string("format").computed())
}

pub(super) fn replacemsg_auth() -> ResourceSchema {
    replacemsg(
        "systemreplacemsg_auth",
        "system.replacemsg/auth",
        "Authentication replacement messages",
    )
}

pub(super) fn replacemsg_mail() -> ResourceSchema {
    replacemsg(
        "systemreplacemsg_mail",
        "system.replacemsg/mail",
        "Mail replacement messages",
    )
}

pub(super) fn replacemsg_fortiguard_wf() -> ResourceSchema {
    replacemsg(
        "systemreplacemsg_fortiguardwf",
        "system.replacemsg/fortiguard-wf",
        "FortiGuard Web Filter replacement messages",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use fortios_schema::ResourceState;

    #[test]
    fn replacement_messages_share_a_shape() {
        for schema in [replacemsg_auth(), replacemsg_mail(), replacemsg_fortiguard_wf()] {
            assert!(schema.path.starts_with("system.replacemsg/"));
            assert!(schema.attribute("msg_type").unwrap().required);
            assert!(!schema.is_vdom_scoped());
        }
    }

    #[test]
    fn buffer_length_is_capped() {
        let schema = replacemsg_mail();
        let mut state = ResourceState::new();
        state.set("msg_type", "email-block");
        state.set("buffer", "x".repeat(32769));
        assert!(schema.validate(&state).is_err());
    }
}
