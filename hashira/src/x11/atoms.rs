use x11rb::atom_manager;

atom_manager! {
    /// EWMH atoms interned once at connection time.
    pub Atoms: AtomsCookie {
        _NET_CLIENT_LIST,
        _NET_CURRENT_DESKTOP,
        _NET_WM_DESKTOP,
        _NET_WM_NAME,
        _NET_WM_STATE,
        _NET_WM_STATE_ABOVE,
        _NET_WM_STATE_STICKY,
        UTF8_STRING,
    }
}

/// `_NET_WM_STATE` client message actions.
pub const NET_WM_STATE_REMOVE: u32 = 0;
pub const NET_WM_STATE_ADD: u32 = 1;

/// Source indication for EWMH requests issued on the user's behalf.
pub const SOURCE_PAGER: u32 = 2;
