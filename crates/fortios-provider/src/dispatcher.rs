//! CRUD Dispatcher.
//!
//! Drives one resource instance through its lifecycle:
//!
//! ```text
//! Absent -> Creating -> Present -> Updating -> Present -> Deleting -> Absent
//! ```
//!
//! Create and Update always finish with a Read so state reflects what the
//! device stored. A Read that finds nothing clears the identity instead of
//! failing.

use crate::registry::ResourceRegistry;
use crate::session::ProviderSession;
use crate::Result;
use fortios_core::{DeviceVersion, Error};
use fortios_schema::{
    build_object, refresh_object, BuildMode, DeleteBehavior, ResourceKind,
    ResourceSchema, ResourceState, TableReadPolicy, ATTR_VDOMPARAM,
};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Lifecycle phase of a resource instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// No remote object is tracked
    Absent,
    /// Create in flight
    Creating,
    /// Remote object tracked
    Present,
    /// Update in flight
    Updating,
    /// Delete in flight
    Deleting,
}

impl Lifecycle {
    /// Resting phase implied by `state`.
    #[must_use]
    pub const fn of(state: &ResourceState) -> Self {
        if state.is_absent() {
            Self::Absent
        } else {
            Self::Present
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Absent => "absent",
            Self::Creating => "creating",
            Self::Present => "present",
            Self::Updating => "updating",
            Self::Deleting => "deleting",
        };
        f.write_str(name)
    }
}

fn transition(schema: &ResourceSchema, from: Lifecycle, to: Lifecycle) {
    info!(resource = schema.type_name, %from, %to, "resource lifecycle");
}

/// Entry points for Create, Read, Update, Delete and Import.
#[derive(Clone)]
pub struct Dispatcher {
    session: Arc<ProviderSession>,
    registry: Arc<ResourceRegistry>,
}

impl Dispatcher {
    /// Create a dispatcher over the built-in resources.
    #[must_use]
    pub fn new(session: Arc<ProviderSession>) -> Self {
        Self::with_registry(session, Arc::new(ResourceRegistry::builtin()))
    }

    /// Create a dispatcher over a custom registry.
    #[must_use]
    pub const fn with_registry(
        session: Arc<ProviderSession>,
        registry: Arc<ResourceRegistry>,
    ) -> Self {
        Self { session, registry }
    }

    /// The session.
    #[must_use]
    pub fn session(&self) -> &ProviderSession {
        &self.session
    }

    /// The registry.
    #[must_use]
    pub fn registry(&self) -> &ResourceRegistry {
        &self.registry
    }

    /// Create the remote object described by `state`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownResource`] for an unregistered type, otherwise
    /// the failure wrapped as [`Error::Operation`].
    pub async fn create(&self, type_name: &str, state: &mut ResourceState) -> Result<()> {
        let schema = self.registry.get(type_name)?;
        self.create_with(schema, state)
            .await
            .map_err(|err| err.during("creating", schema.type_name))
    }

    /// Push changed attributes of an existing object.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::create`].
    pub async fn update(&self, type_name: &str, state: &mut ResourceState) -> Result<()> {
        let schema = self.registry.get(type_name)?;
        self.update_with(schema, state)
            .await
            .map_err(|err| err.during("updating", schema.type_name))
    }

    /// Remove the object, then clear local identity.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::create`].
    pub async fn delete(&self, type_name: &str, state: &mut ResourceState) -> Result<()> {
        let schema = self.registry.get(type_name)?;
        self.delete_with(schema, state)
            .await
            .map_err(|err| err.during("deleting", schema.type_name))
    }

    /// Refresh `state` from the device.
    ///
    /// An object the device no longer has leaves `state` absent; that is not
    /// an error.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::create`].
    pub async fn read(&self, type_name: &str, state: &mut ResourceState) -> Result<()> {
        let schema = self.registry.get(type_name)?;
        self.read_with(schema, state, None)
            .await
            .map_err(|err| err.during("reading", schema.type_name))
    }

    /// Adopt an existing object by identity, reading every nested table.
    ///
    /// # Errors
    ///
    /// See [`Dispatcher::create`]. An id the device does not know is an
    /// [`Error::NotFound`].
    pub async fn import(&self, type_name: &str, id: &str) -> Result<ResourceState> {
        let schema = self.registry.get(type_name)?;
        let mut state = ResourceState::new();
        state.set_id(id);

        self.read_with(schema, &mut state, Some(TableReadPolicy::ImportAll))
            .await
            .map_err(|err| err.during("importing", schema.type_name))?;

        if state.is_absent() {
            return Err(Error::NotFound(format!("{type_name} `{id}`"))
                .during("importing", schema.type_name));
        }
        Ok(state)
    }

    /// Create using an explicit schema.
    ///
    /// # Errors
    ///
    /// Returns validation, conversion or transport errors unwrapped.
    pub async fn create_with(&self, schema: &ResourceSchema, state: &mut ResourceState) -> Result<()> {
        let version = self.prepare(schema, state).await?;
        let vdom = self.resolve_vdom(schema, state, true);

        transition(schema, Lifecycle::of(state), Lifecycle::Creating);
        let object = build_object(schema, state, Some(&version), BuildMode::Apply)?;
        let transport = self.session.transport();
        let response = match schema.kind {
            ResourceKind::Collection { .. } => {
                transport.create(schema.path, &object, vdom.as_deref()).await?
            }
            ResourceKind::Settings { .. } => {
                transport
                    .update(schema.path, &object, None, vdom.as_deref())
                    .await?
            }
        };

        state.set_id(response.mkey().unwrap_or_else(|| schema.type_name.to_string()));
        transition(schema, Lifecycle::Creating, Lifecycle::Present);
        self.read_with(schema, state, None).await
    }

    /// Update using an explicit schema.
    ///
    /// # Errors
    ///
    /// Returns validation, conversion or transport errors unwrapped. A
    /// collection member without an id, or a changed force-new attribute, is
    /// a [`Error::ValidationError`] raised before anything is sent.
    pub async fn update_with(&self, schema: &ResourceSchema, state: &mut ResourceState) -> Result<()> {
        let mkey = member_key(schema, state);
        if matches!(schema.kind, ResourceKind::Collection { .. }) && mkey.is_none() {
            return Err(Error::ValidationError(format!(
                "{}: cannot update without an id",
                schema.type_name
            )));
        }
        schema.check_in_place_update(state)?;
        let version = self.prepare(schema, state).await?;
        let vdom = self.resolve_vdom(schema, state, true);

        transition(schema, Lifecycle::of(state), Lifecycle::Updating);
        let object = build_object(schema, state, Some(&version), BuildMode::Apply)?;
        let response = self
            .session
            .transport()
            .update(schema.path, &object, mkey.as_deref(), vdom.as_deref())
            .await?;

        let id = response
            .mkey()
            .or(mkey)
            .unwrap_or_else(|| schema.type_name.to_string());
        state.set_id(id);
        transition(schema, Lifecycle::Updating, Lifecycle::Present);
        self.read_with(schema, state, None).await
    }

    /// Delete using an explicit schema.
    ///
    /// # Errors
    ///
    /// Returns transport errors unwrapped. A collection member without an id
    /// has nothing remote to remove and only clears local state.
    pub async fn delete_with(&self, schema: &ResourceSchema, state: &mut ResourceState) -> Result<()> {
        let vdom = self.resolve_vdom(schema, state, false);
        let mkey = member_key(schema, state);
        let transport = self.session.transport();

        transition(schema, Lifecycle::of(state), Lifecycle::Deleting);
        match schema.kind {
            ResourceKind::Collection { .. } => match mkey.as_deref() {
                Some(mkey) => transport.delete(schema.path, Some(mkey), vdom.as_deref()).await?,
                None => debug!(resource = schema.type_name, "no id, nothing to delete remotely"),
            },
            ResourceKind::Settings {
                on_delete: DeleteBehavior::Reset,
            } => {
                let version = self.session.device_version().await?;
                let object = build_object(schema, state, Some(&version), BuildMode::Clear)?;
                transport
                    .update(schema.path, &object, None, vdom.as_deref())
                    .await?;
            }
            ResourceKind::Settings {
                on_delete: DeleteBehavior::Remove,
            } => {
                transport.delete(schema.path, None, vdom.as_deref()).await?;
            }
            ResourceKind::Settings {
                on_delete: DeleteBehavior::Forget,
            } => {
                debug!(resource = schema.type_name, "dropping settings from state only");
            }
        }

        state.clear_id();
        transition(schema, Lifecycle::Deleting, Lifecycle::Absent);
        Ok(())
    }

    /// Read using an explicit schema, optionally forcing a table policy.
    ///
    /// # Errors
    ///
    /// Returns conversion or transport errors unwrapped.
    pub async fn read_with(
        &self,
        schema: &ResourceSchema,
        state: &mut ResourceState,
        policy: Option<TableReadPolicy>,
    ) -> Result<()> {
        if state.is_absent() {
            debug!(resource = schema.type_name, "nothing to read for absent resource");
            return Ok(());
        }

        let version = self.session.device_version().await?;
        let vdom = self.resolve_vdom(schema, state, true);
        let mkey = member_key(schema, state);

        let Some(object) = self
            .session
            .transport()
            .read(schema.path, mkey.as_deref(), vdom.as_deref())
            .await?
        else {
            info!(
                resource = schema.type_name,
                id = state.id().unwrap_or_default(),
                "resource not found on device, removing from state"
            );
            state.clear_id();
            return Ok(());
        };

        let mut options = self.session.refresh_options(version);
        if let Some(policy) = policy {
            options = options.with_policy(policy);
        }
        refresh_object(schema, state, &object, &options)?;
        state.commit();
        Ok(())
    }

    async fn prepare(&self, schema: &ResourceSchema, state: &mut ResourceState) -> Result<DeviceVersion> {
        let version = self.session.device_version().await?;
        schema.check_version(&version)?;
        schema.apply_defaults(state);
        schema.validate(state)?;
        Ok(version)
    }

    /// State `vdomparam` if set, else the session default, which is written
    /// back into state when `write_back` is set. Global resources have none.
    fn resolve_vdom(
        &self,
        schema: &ResourceSchema,
        state: &mut ResourceState,
        write_back: bool,
    ) -> Option<String> {
        if !schema.is_vdom_scoped() {
            return None;
        }
        if let Some(vdom) = state.get_str(ATTR_VDOMPARAM) {
            return Some(vdom.to_string());
        }
        let vdom = self.session.default_vdom()?.to_string();
        if write_back {
            state.set(ATTR_VDOMPARAM, vdom.as_str());
        }
        Some(vdom)
    }
}

fn member_key(schema: &ResourceSchema, state: &ResourceState) -> Option<String> {
    match schema.kind {
        ResourceKind::Collection { .. } => state
            .id()
            .filter(|id| !id.is_empty())
            .map(str::to_string),
        ResourceKind::Settings { .. } => None,
    }
}
