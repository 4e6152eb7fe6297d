use alloy_primitives::Address;
use kunlun_primitives::Entrypoint;

/// Decides whether `caller` may act for `principal`. Only consulted when they differ.
#[cfg_attr(test, mockall::automock)]
pub trait PermissionController {
    fn can_call(&self, principal: &Address, caller: &Address, entrypoint: Entrypoint) -> bool;
}
