//
// Copyright (c) The Holo Core Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::Ipv4Addr;

use tracing::warn;

use crate::packet::error::LsaValidationError;
use crate::peer::PeerId;
use crate::version::Version;

// OSPF errors.
#[derive(Debug)]
pub enum Error<V: Version> {
    // Peer manager input
    AreaAlreadyExists(Ipv4Addr),
    AreaNotFound(Ipv4Addr),
    AreaBusy(Ipv4Addr),
    PeerNotFound(PeerId),
    PeerBusy(PeerId),
    PeerDown(PeerId),
    // LSDB input
    LsaInvalid(LsaValidationError),
    LsaWrongType(V::LsaType),
    LsaNotSelfOriginated(Ipv4Addr),
    // SPF
    SpfRootNotFound(Ipv4Addr),
    SpfNexthopCalcError(V::VertexId),
    // I/O sink
    RouteInstallError(V::IpNetwork),
    RouteUninstallError(V::IpNetwork),
}

// ===== impl Error =====

impl<V> Error<V>
where
    V: Version,
{
    pub(crate) fn log(&self) {
        match self {
            Error::AreaAlreadyExists(area_id)
            | Error::AreaNotFound(area_id)
            | Error::AreaBusy(area_id) => {
                warn!(%area_id, "{}", self);
            }
            Error::PeerNotFound(peer_id)
            | Error::PeerBusy(peer_id)
            | Error::PeerDown(peer_id) => {
                warn!(%peer_id, "{}", self);
            }
            Error::LsaInvalid(error) => {
                warn!(%error, "{}", self);
            }
            Error::LsaWrongType(lsa_type) => {
                warn!(%lsa_type, "{}", self);
            }
            Error::LsaNotSelfOriginated(adv_rtr) => {
                warn!(%adv_rtr, "{}", self);
            }
            Error::SpfRootNotFound(router_id) => {
                warn!(%router_id, "{}", self);
            }
            Error::SpfNexthopCalcError(vertex_id) => {
                warn!(?vertex_id, "{}", self);
            }
            Error::RouteInstallError(prefix)
            | Error::RouteUninstallError(prefix) => {
                warn!(%prefix, "{}", self);
            }
        }
    }
}

impl<V> std::fmt::Display for Error<V>
where
    V: Version,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::AreaAlreadyExists(..) => {
                write!(f, "area already exists")
            }
            Error::AreaNotFound(..) => {
                write!(f, "area not found")
            }
            Error::AreaBusy(..) => {
                write!(f, "area still has peers attached")
            }
            Error::PeerNotFound(..) => {
                write!(f, "peer not found")
            }
            Error::PeerBusy(..) => {
                write!(f, "peer is still enabled")
            }
            Error::PeerDown(..) => {
                write!(f, "peer is not enabled")
            }
            Error::LsaInvalid(..) => {
                write!(f, "discarding invalid LSA")
            }
            Error::LsaWrongType(..) => {
                write!(f, "unexpected LSA type")
            }
            Error::LsaNotSelfOriginated(..) => {
                write!(f, "LSA was not originated by this router")
            }
            Error::SpfRootNotFound(..) => {
                write!(f, "SPF root not found")
            }
            Error::SpfNexthopCalcError(..) => {
                write!(f, "failed to calculate nexthop address")
            }
            Error::RouteInstallError(..) => {
                write!(f, "failed to install route")
            }
            Error::RouteUninstallError(..) => {
                write!(f, "failed to uninstall route")
            }
        }
    }
}

impl<V> std::error::Error for Error<V>
where
    V: Version,
{
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::LsaInvalid(error) => Some(error),
            _ => None,
        }
    }
}
