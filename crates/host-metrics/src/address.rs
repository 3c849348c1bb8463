use {
    crate::natural_key,
    itertools::Itertools,
    std::net::{IpAddr, Ipv4Addr},
    tap::prelude::*,
    tracing::instrument,
};

#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display("{interface}: {address}")]
pub struct InterfaceAddress {
    pub interface: String,
    pub address: Ipv4Addr,
}

/// IPv4 entries of an interface's assigned networks, IPv6 ones are dropped.
fn interface_ipv4<'a>(interface: &'a str, addresses: impl IntoIterator<Item = IpAddr> + 'a) -> impl Iterator<Item = InterfaceAddress> + 'a {
    addresses.into_iter().filter_map(move |address| match address {
        IpAddr::V4(address) => Some(InterfaceAddress {
            interface: interface.to_owned(),
            address,
        }),
        IpAddr::V6(_) => None,
    })
}

fn sorted(addresses: impl IntoIterator<Item = InterfaceAddress>) -> Vec<InterfaceAddress> {
    addresses
        .into_iter()
        .sorted_by(|a, b| {
            natural_key(&a.interface)
                .cmp(&natural_key(&b.interface))
                .then(a.address.cmp(&b.address))
        })
        .collect()
}

/// Every IPv4 address assigned to an interface, interfaces in natural name order.
#[instrument(level = "TRACE")]
pub fn ipv4_addresses() -> Vec<InterfaceAddress> {
    let networks = sysinfo::Networks::new_with_refreshed_list();
    networks
        .list()
        .iter()
        .flat_map(|(interface, data)| interface_ipv4(interface, data.ip_networks().iter().map(|network| network.addr)))
        .pipe(sorted)
}

pub fn first_non_skipped(addresses: Vec<InterfaceAddress>, skip: &[String]) -> Option<InterfaceAddress> {
    addresses
        .into_iter()
        .find(|address| !skip.iter().any(|skipped| skipped == &address.interface))
}

/// First IPv4 address that does not belong to one of the `skip` interfaces.
pub fn first_ipv4(skip: &[String]) -> Option<InterfaceAddress> {
    first_non_skipped(ipv4_addresses(), skip)
}
