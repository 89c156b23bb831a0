// Authorization policy engine.
//
// Every request re-evaluates the caller's profile, tenant membership and
// role against the targeted resource. The engine is a pure decision
// function: callers fetch the resource's actual tenant fresh from the
// database and never cache a decision across requests.

use uuid::Uuid;

use crate::config;
use crate::middleware::auth::AuthUser;

/// Role stored on a profile. Unknown strings collapse to `Member` so a
/// mistyped role can only ever reduce privileges. `System` marks platform
/// bookkeeping profiles; it carries no tenant-admin rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Member,
    System,
}

impl Role {
    pub fn parse(value: &str) -> Role {
        match value {
            "admin" => Role::Admin,
            "system" => Role::System,
            _ => Role::Member,
        }
    }
}

/// The caller's profile state, loaded fresh for the current request.
/// `tenant_active` is the owning tenant's is_active flag.
#[derive(Debug, Clone)]
pub struct ProfileContext {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub role: Role,
    pub is_active: bool,
    pub tenant_active: bool,
}

/// What the action targets. `Tenant` carries the tenant id resolved from
/// the fetched resource row (a case's tenant_id, a slot's parent case's
/// tenant_id), never a client-supplied value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// Platform-level, not owned by any tenant.
    Platform,
    /// The caller's own tenant scope (creating or listing within it).
    OwnTenant,
    /// A concrete resource whose owning tenant was resolved from storage.
    Tenant(Option<Uuid>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    ListTenants,
    CreateTenant,
    ToggleTenantActive,
    ListCases,
    ReadCase { created_by: Option<Uuid> },
    CreateCase,
    UpdateCase,
    CreateSlot,
    UpdateSlot,
    DeleteSlot,
    ListUsers,
    CreateUser,
    ToggleUserActive { target: Uuid },
}

impl Action {
    /// Tenant-administration actions are the only ones the super-admin
    /// gate short-circuits.
    fn is_tenant_admin(&self) -> bool {
        matches!(
            self,
            Action::ListTenants | Action::CreateTenant | Action::ToggleTenantActive
        )
    }

    /// Actions no tenant role may perform, super-admin only.
    fn requires_super_admin(&self) -> bool {
        matches!(self, Action::ListTenants | Action::ToggleTenantActive)
    }

    /// Account-management actions gated on the admin role.
    fn requires_admin_role(&self) -> bool {
        matches!(
            self,
            Action::ListUsers | Action::CreateUser | Action::ToggleUserActive { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NoTenant,
    CrossTenant,
    InsufficientRole,
    SelfModification,
    AccountDisabled,
}

impl DenyReason {
    pub fn message(&self) -> &'static str {
        match self {
            DenyReason::NoTenant => "No tenant membership for this account",
            DenyReason::CrossTenant => "Access denied for this resource",
            DenyReason::InsufficientRole => "Insufficient role for this action",
            DenyReason::SelfModification => "You cannot deactivate your own account",
            DenyReason::AccountDisabled => "Account is disabled",
        }
    }
}

/// Process-wide super-admin gate: at most one designated email, loaded
/// once from configuration. Absent configuration disables the feature.
#[derive(Debug, Clone, Copy)]
pub struct SuperAdminGate<'a> {
    email: Option<&'a str>,
}

impl<'a> SuperAdminGate<'a> {
    pub fn new(email: Option<&'a str>) -> Self {
        Self { email }
    }

    pub fn from_config() -> SuperAdminGate<'static> {
        SuperAdminGate::new(config::config().security.super_admin_email.as_deref())
    }

    /// Independent of the profile store: a super-admin needs no profile row.
    pub fn is_super_admin(&self, email: &str) -> bool {
        match self.email {
            Some(configured) => configured.eq_ignore_ascii_case(email),
            None => false,
        }
    }
}

/// Decide whether `identity` may perform `action` on `resource`.
/// Rules are evaluated in order, first match wins. Pure, no side effects.
pub fn authorize(
    identity: &AuthUser,
    gate: &SuperAdminGate,
    profile: Option<&ProfileContext>,
    resource: Resource,
    action: &Action,
) -> Result<(), DenyReason> {
    // 1. Super-admin short-circuit, tenant administration only. Everything
    //    else falls through so a super-admin gains no implicit access to
    //    tenant-owned data.
    if action.is_tenant_admin() && gate.is_super_admin(&identity.email) {
        return Ok(());
    }

    // 2. A profile with an assigned tenant is required for everything else.
    let profile = match profile {
        Some(p) if p.tenant_id.is_some() => p,
        _ => return Err(DenyReason::NoTenant),
    };

    // 3. Disabled accounts and members of deactivated tenants are refused
    //    on every request, not only at login.
    if !profile.is_active || !profile.tenant_active {
        return Err(DenyReason::AccountDisabled);
    }

    if action.requires_super_admin() {
        return Err(DenyReason::InsufficientRole);
    }

    // 4. Tenant scoping against the resource's actual tenant. A resource
    //    with no tenant (unassigned webhook case) is invisible to everyone.
    if let Resource::Tenant(resource_tenant) = resource {
        if resource_tenant.is_none() || resource_tenant != profile.tenant_id {
            return Err(DenyReason::CrossTenant);
        }
    }

    // 5. Members only reach cases they created; admins see the whole tenant.
    if let Action::ReadCase { created_by } = action {
        if profile.role != Role::Admin && *created_by != Some(profile.id) {
            return Err(DenyReason::InsufficientRole);
        }
    }

    // 6. Self-protection, regardless of role.
    if let Action::ToggleUserActive { target } = action {
        if *target == profile.id {
            return Err(DenyReason::SelfModification);
        }
    }

    // 7. Role gate for account management.
    if action.requires_admin_role() && profile.role != Role::Admin {
        return Err(DenyReason::InsufficientRole);
    }

    Ok(())
}

/// Case listing scope implied by the caller's role (policy rule 5 for
/// collection queries).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseVisibility {
    AllInTenant(Uuid),
    OwnOnly { tenant_id: Uuid, created_by: Uuid },
}

pub fn case_visibility(profile: &ProfileContext) -> Option<CaseVisibility> {
    let tenant_id = profile.tenant_id?;
    match profile.role {
        Role::Admin => Some(CaseVisibility::AllInTenant(tenant_id)),
        _ => Some(CaseVisibility::OwnOnly {
            tenant_id,
            created_by: profile.id,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(email: &str) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: email.to_string(),
        }
    }

    fn profile(tenant_id: Uuid, role: Role) -> ProfileContext {
        ProfileContext {
            id: Uuid::new_v4(),
            tenant_id: Some(tenant_id),
            role,
            is_active: true,
            tenant_active: true,
        }
    }

    const OPS: Option<&str> = Some("ops@example.com");

    #[test]
    fn test_super_admin_gate_is_case_insensitive() {
        let gate = SuperAdminGate::new(OPS);
        assert!(gate.is_super_admin("OPS@Example.COM"));
        assert!(!gate.is_super_admin("someone@example.com"));
    }

    #[test]
    fn test_super_admin_gate_disabled_without_config() {
        let gate = SuperAdminGate::new(None);
        assert!(!gate.is_super_admin("ops@example.com"));
    }

    #[test]
    fn test_super_admin_manages_tenants_without_profile() {
        let gate = SuperAdminGate::new(OPS);
        let id = identity("ops@example.com");
        assert_eq!(
            authorize(&id, &gate, None, Resource::Platform, &Action::ListTenants),
            Ok(())
        );
        assert_eq!(
            authorize(
                &id,
                &gate,
                None,
                Resource::Platform,
                &Action::ToggleTenantActive
            ),
            Ok(())
        );
    }

    #[test]
    fn test_super_admin_gets_no_implicit_tenant_data_access() {
        let gate = SuperAdminGate::new(OPS);
        let id = identity("ops@example.com");
        let foreign = Uuid::new_v4();
        let action = Action::ReadCase { created_by: None };
        assert_eq!(
            authorize(&id, &gate, None, Resource::Tenant(Some(foreign)), &action),
            Err(DenyReason::NoTenant)
        );
    }

    #[test]
    fn test_no_profile_denied() {
        let gate = SuperAdminGate::new(None);
        assert_eq!(
            authorize(
                &identity("a@b.com"),
                &gate,
                None,
                Resource::OwnTenant,
                &Action::CreateCase
            ),
            Err(DenyReason::NoTenant)
        );
    }

    #[test]
    fn test_profile_without_tenant_denied() {
        let gate = SuperAdminGate::new(None);
        let mut p = profile(Uuid::new_v4(), Role::Member);
        p.tenant_id = None;
        assert_eq!(
            authorize(
                &identity("a@b.com"),
                &gate,
                Some(&p),
                Resource::OwnTenant,
                &Action::CreateCase
            ),
            Err(DenyReason::NoTenant)
        );
    }

    #[test]
    fn test_disabled_profile_denied_on_every_action() {
        let gate = SuperAdminGate::new(None);
        let tenant = Uuid::new_v4();
        let mut p = profile(tenant, Role::Admin);
        p.is_active = false;
        assert_eq!(
            authorize(
                &identity("a@b.com"),
                &gate,
                Some(&p),
                Resource::Tenant(Some(tenant)),
                &Action::UpdateCase
            ),
            Err(DenyReason::AccountDisabled)
        );
    }

    #[test]
    fn test_deactivated_tenant_blocks_members() {
        let gate = SuperAdminGate::new(None);
        let tenant = Uuid::new_v4();
        let mut p = profile(tenant, Role::Admin);
        p.tenant_active = false;
        assert_eq!(
            authorize(
                &identity("a@b.com"),
                &gate,
                Some(&p),
                Resource::OwnTenant,
                &Action::ListCases
            ),
            Err(DenyReason::AccountDisabled)
        );
    }

    #[test]
    fn test_cross_tenant_denied_regardless_of_role() {
        let gate = SuperAdminGate::new(None);
        let foreign = Uuid::new_v4();
        for role in [Role::Admin, Role::Member, Role::System] {
            let p = profile(Uuid::new_v4(), role);
            assert_eq!(
                authorize(
                    &identity("a@b.com"),
                    &gate,
                    Some(&p),
                    Resource::Tenant(Some(foreign)),
                    &Action::UpdateCase
                ),
                Err(DenyReason::CrossTenant),
                "role {:?}",
                role
            );
        }
    }

    #[test]
    fn test_case_without_tenant_is_invisible() {
        let gate = SuperAdminGate::new(None);
        let p = profile(Uuid::new_v4(), Role::Admin);
        assert_eq!(
            authorize(
                &identity("a@b.com"),
                &gate,
                Some(&p),
                Resource::Tenant(None),
                &Action::ReadCase { created_by: None }
            ),
            Err(DenyReason::CrossTenant)
        );
    }

    #[test]
    fn test_member_cannot_read_another_members_case() {
        let gate = SuperAdminGate::new(None);
        let tenant = Uuid::new_v4();
        let p = profile(tenant, Role::Member);
        let action = Action::ReadCase {
            created_by: Some(Uuid::new_v4()),
        };
        assert_eq!(
            authorize(
                &identity("a@b.com"),
                &gate,
                Some(&p),
                Resource::Tenant(Some(tenant)),
                &action
            ),
            Err(DenyReason::InsufficientRole)
        );
    }

    #[test]
    fn test_member_reads_own_case_admin_reads_all() {
        let gate = SuperAdminGate::new(None);
        let tenant = Uuid::new_v4();
        let member = profile(tenant, Role::Member);
        let own = Action::ReadCase {
            created_by: Some(member.id),
        };
        assert_eq!(
            authorize(
                &identity("a@b.com"),
                &gate,
                Some(&member),
                Resource::Tenant(Some(tenant)),
                &own
            ),
            Ok(())
        );

        let admin = profile(tenant, Role::Admin);
        let someone_elses = Action::ReadCase {
            created_by: Some(Uuid::new_v4()),
        };
        assert_eq!(
            authorize(
                &identity("a@b.com"),
                &gate,
                Some(&admin),
                Resource::Tenant(Some(tenant)),
                &someone_elses
            ),
            Ok(())
        );
    }

    #[test]
    fn test_self_deactivation_denied_for_every_role() {
        let gate = SuperAdminGate::new(None);
        for role in [Role::Admin, Role::Member, Role::System] {
            let p = profile(Uuid::new_v4(), role);
            let action = Action::ToggleUserActive { target: p.id };
            assert_eq!(
                authorize(
                    &identity("a@b.com"),
                    &gate,
                    Some(&p),
                    Resource::OwnTenant,
                    &action
                ),
                Err(DenyReason::SelfModification),
                "role {:?}",
                role
            );
        }
    }

    #[test]
    fn test_member_cannot_manage_users() {
        let gate = SuperAdminGate::new(None);
        let p = profile(Uuid::new_v4(), Role::Member);
        let action = Action::ToggleUserActive {
            target: Uuid::new_v4(),
        };
        assert_eq!(
            authorize(
                &identity("a@b.com"),
                &gate,
                Some(&p),
                Resource::OwnTenant,
                &action
            ),
            Err(DenyReason::InsufficientRole)
        );
        assert_eq!(
            authorize(
                &identity("a@b.com"),
                &gate,
                Some(&p),
                Resource::OwnTenant,
                &Action::CreateUser
            ),
            Err(DenyReason::InsufficientRole)
        );
    }

    #[test]
    fn test_admin_manages_other_users() {
        let gate = SuperAdminGate::new(None);
        let p = profile(Uuid::new_v4(), Role::Admin);
        let action = Action::ToggleUserActive {
            target: Uuid::new_v4(),
        };
        assert_eq!(
            authorize(
                &identity("a@b.com"),
                &gate,
                Some(&p),
                Resource::OwnTenant,
                &action
            ),
            Ok(())
        );
    }

    #[test]
    fn test_tenant_admin_cannot_enumerate_tenants() {
        let gate = SuperAdminGate::new(OPS);
        let p = profile(Uuid::new_v4(), Role::Admin);
        assert_eq!(
            authorize(
                &identity("admin@tenant.com"),
                &gate,
                Some(&p),
                Resource::Platform,
                &Action::ListTenants
            ),
            Err(DenyReason::InsufficientRole)
        );
    }

    #[test]
    fn test_active_profile_may_provision_tenant() {
        let gate = SuperAdminGate::new(None);
        let p = profile(Uuid::new_v4(), Role::Member);
        assert_eq!(
            authorize(
                &identity("a@b.com"),
                &gate,
                Some(&p),
                Resource::Platform,
                &Action::CreateTenant
            ),
            Ok(())
        );
    }

    #[test]
    fn test_unknown_role_parses_to_member() {
        assert_eq!(Role::parse("owner"), Role::Member);
        assert_eq!(Role::parse("admin"), Role::Admin);
        assert_eq!(Role::parse("system"), Role::System);
    }

    #[test]
    fn test_case_visibility_by_role() {
        let tenant = Uuid::new_v4();
        let admin = profile(tenant, Role::Admin);
        assert_eq!(
            case_visibility(&admin),
            Some(CaseVisibility::AllInTenant(tenant))
        );

        let member = profile(tenant, Role::Member);
        assert_eq!(
            case_visibility(&member),
            Some(CaseVisibility::OwnOnly {
                tenant_id: tenant,
                created_by: member.id
            })
        );

        let mut unassigned = profile(tenant, Role::Member);
        unassigned.tenant_id = None;
        assert_eq!(case_visibility(&unassigned), None);
    }
}
