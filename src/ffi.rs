#![allow(clippy::not_unsafe_ptr_arg_deref)]

// C ABI over the registry: repr(C) mirror types, stable integer status codes,
// null-checked pointer arguments, opaque boxed handle.

use crate::MAX_OPTION_COUNT;
use crate::poll::{PollId, derive_poll_id};
use crate::registry::{PollError, PollRegistry};

#[repr(C)]
#[allow(non_camel_case_types)]
#[derive(Clone, Copy)]
pub struct pollreg_id_t {
    pub bytes: [u8; 32],
}

#[repr(C)]
#[allow(non_camel_case_types)]
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum pollreg_result_t {
    POLLREG_OK = 0,
    POLLREG_ERR_INVALID_OPTION_COUNT = 1,
    POLLREG_ERR_DEADLINE_IN_PAST = 2,
    POLLREG_ERR_POLL_ALREADY_EXISTS = 3,
    POLLREG_ERR_POLL_EXPIRED = 4,
    POLLREG_ERR_ALREADY_VOTED = 5,
    POLLREG_ERR_INVALID_OPTION = 6,
    POLLREG_ERR_NULL_ARG = 7,
}

#[repr(C)]
#[allow(non_camel_case_types)]
#[derive(Clone, Copy)]
pub struct pollreg_poll_view_t {
    pub deadline_ms: u64,
    /// First `option_count` entries are meaningful.
    pub vote_counts: [u64; MAX_OPTION_COUNT as usize],
    pub option_count: u8,
    pub exists: bool,
}

#[repr(C)]
#[allow(non_camel_case_types)]
#[derive(Clone, Copy)]
pub struct pollreg_vote_status_t {
    pub has_voted: bool,
    pub option_id: u8,
}

fn result_from_error(err: PollError) -> pollreg_result_t {
    match err {
        PollError::InvalidOptionCount => pollreg_result_t::POLLREG_ERR_INVALID_OPTION_COUNT,
        PollError::DeadlineInPast => pollreg_result_t::POLLREG_ERR_DEADLINE_IN_PAST,
        PollError::PollAlreadyExists => pollreg_result_t::POLLREG_ERR_POLL_ALREADY_EXISTS,
        PollError::PollExpired => pollreg_result_t::POLLREG_ERR_POLL_EXPIRED,
        PollError::AlreadyVoted => pollreg_result_t::POLLREG_ERR_ALREADY_VOTED,
        PollError::InvalidOption => pollreg_result_t::POLLREG_ERR_INVALID_OPTION,
    }
}

fn write_id(out: *mut pollreg_id_t, id: &PollId) {
    if !out.is_null() {
        unsafe {
            (*out).bytes = *id;
        }
    }
}

/// Heap-allocates a registry with the default in-memory store and system
/// clock. Free with pollreg_registry_free.
#[unsafe(no_mangle)]
pub extern "C" fn pollreg_registry_new() -> *mut PollRegistry {
    Box::into_raw(Box::new(PollRegistry::new()))
}

#[unsafe(no_mangle)]
pub extern "C" fn pollreg_registry_free(registry: *mut PollRegistry) {
    if !registry.is_null() {
        drop(unsafe { Box::from_raw(registry) });
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn pollreg_derive_poll_id(
    pre_id: *const pollreg_id_t,
    option_count: u8,
    deadline_ms: u64,
    out_id: *mut pollreg_id_t,
) -> bool {
    if pre_id.is_null() || out_id.is_null() {
        return false;
    }
    let pre = unsafe { (*pre_id).bytes };
    let id = derive_poll_id(&pre, option_count, deadline_ms);
    write_id(out_id, &id);
    true
}

#[unsafe(no_mangle)]
pub extern "C" fn pollreg_create_poll(
    registry: *mut PollRegistry,
    pre_id: *const pollreg_id_t,
    option_count: u8,
    deadline_ms: u64,
    out_id: *mut pollreg_id_t,
) -> pollreg_result_t {
    if registry.is_null() || pre_id.is_null() {
        return pollreg_result_t::POLLREG_ERR_NULL_ARG;
    }
    let registry = unsafe { &*registry };
    let pre = unsafe { (*pre_id).bytes };
    match registry.create_poll(&pre, option_count, deadline_ms) {
        Ok(id) => {
            write_id(out_id, &id);
            pollreg_result_t::POLLREG_OK
        }
        Err(err) => result_from_error(err),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn pollreg_cast_vote(
    registry: *mut PollRegistry,
    pre_id: *const pollreg_id_t,
    option_id: u8,
    option_count: u8,
    deadline_ms: u64,
    voter: *const pollreg_id_t,
    out_id: *mut pollreg_id_t,
) -> pollreg_result_t {
    if registry.is_null() || pre_id.is_null() || voter.is_null() {
        return pollreg_result_t::POLLREG_ERR_NULL_ARG;
    }
    let registry = unsafe { &*registry };
    let pre = unsafe { (*pre_id).bytes };
    let voter = unsafe { (*voter).bytes };
    match registry.cast_vote(&pre, option_id, option_count, deadline_ms, &voter) {
        Ok(id) => {
            write_id(out_id, &id);
            pollreg_result_t::POLLREG_OK
        }
        Err(err) => result_from_error(err),
    }
}

#[unsafe(no_mangle)]
pub extern "C" fn pollreg_get_poll(
    registry: *const PollRegistry,
    poll_id: *const pollreg_id_t,
    out_view: *mut pollreg_poll_view_t,
) -> bool {
    if registry.is_null() || poll_id.is_null() || out_view.is_null() {
        return false;
    }
    let registry = unsafe { &*registry };
    let id = unsafe { (*poll_id).bytes };
    let view = registry.get_poll(&id);

    let mut counts = [0u64; MAX_OPTION_COUNT as usize];
    for (slot, count) in counts.iter_mut().zip(view.vote_counts.iter()) {
        *slot = *count;
    }
    unsafe {
        *out_view = pollreg_poll_view_t {
            deadline_ms: view.deadline_ms,
            vote_counts: counts,
            option_count: view.option_count,
            exists: view.exists,
        };
    }
    true
}

#[unsafe(no_mangle)]
pub extern "C" fn pollreg_get_vote_status(
    registry: *const PollRegistry,
    poll_id: *const pollreg_id_t,
    identity: *const pollreg_id_t,
    out_status: *mut pollreg_vote_status_t,
) -> bool {
    if registry.is_null() || poll_id.is_null() || identity.is_null() || out_status.is_null() {
        return false;
    }
    let registry = unsafe { &*registry };
    let id = unsafe { (*poll_id).bytes };
    let who = unsafe { (*identity).bytes };
    let status = registry.get_vote_status(&id, &who);
    unsafe {
        *out_status = pollreg_vote_status_t {
            has_voted: status.has_voted,
            option_id: status.option_id,
        };
    }
    true
}

#[unsafe(no_mangle)]
pub extern "C" fn pollreg_is_expired(
    registry: *const PollRegistry,
    poll_id: *const pollreg_id_t,
) -> bool {
    if registry.is_null() || poll_id.is_null() {
        return false;
    }
    let registry = unsafe { &*registry };
    let id = unsafe { (*poll_id).bytes };
    registry.is_expired(&id)
}
