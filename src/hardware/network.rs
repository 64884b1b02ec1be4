//! Network interface detection module

use std::net::IpAddr;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sysinfo::Networks;

use super::sysfs::read_i64;
use crate::error::ProbeResult;

/// Network interface information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Network {
    /// Kernel interface index, as text; empty when unknown
    pub interface_index: String,
    /// Interface name (e.g., "eth0", "wlp3s0")
    pub description: String,
    pub mac_address: String,
    pub ipv4_address: String,
    pub ipv6_address: String,
}

/// Interface data as sysinfo reports it
#[derive(Debug, Clone)]
pub(crate) struct InterfaceData {
    pub name: String,
    pub mac: String,
    pub addresses: Vec<IpAddr>,
}

impl Network {
    /// Detect network interfaces, sorted by name
    pub(crate) fn detect(sys_root: &Path) -> ProbeResult<Vec<Network>> {
        let networks = Networks::new_with_refreshed_list();

        let mut interfaces: Vec<InterfaceData> = networks
            .list()
            .iter()
            .map(|(name, data)| InterfaceData {
                name: name.clone(),
                mac: data.mac_address().to_string(),
                addresses: data.ip_networks().iter().map(|net| net.addr).collect(),
            })
            .collect();
        interfaces.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(build_networks(&interfaces, sys_root))
    }
}

pub(crate) fn build_networks(interfaces: &[InterfaceData], sys_root: &Path) -> Vec<Network> {
    interfaces
        .iter()
        .map(|interface| {
            let index = read_i64(
                sys_root
                    .join("class/net")
                    .join(&interface.name)
                    .join("ifindex"),
            )
            .map(|index| index.to_string())
            .unwrap_or_default();

            let ipv4 = interface.addresses.iter().find(|addr| addr.is_ipv4());
            let ipv6 = interface.addresses.iter().find(|addr| addr.is_ipv6());

            Network {
                interface_index: index,
                description: interface.name.clone(),
                mac_address: interface.mac.clone(),
                ipv4_address: ipv4.map(|a| a.to_string()).unwrap_or_default(),
                ipv6_address: ipv6.map(|a| a.to_string()).unwrap_or_default(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::net::{Ipv4Addr, Ipv6Addr};
    use tempfile::TempDir;

    #[test]
    fn build_networks_picks_first_address_of_each_family() {
        let temp_dir = TempDir::new().unwrap();
        let eth0 = temp_dir.path().join("class/net/eth0");
        fs::create_dir_all(&eth0).unwrap();
        fs::write(eth0.join("ifindex"), "2\n").unwrap();

        let interfaces = vec![
            InterfaceData {
                name: "eth0".to_string(),
                mac: "52:54:00:12:34:56".to_string(),
                addresses: vec![
                    IpAddr::V6(Ipv6Addr::new(0xfe80, 0, 0, 0, 0x5054, 0xff, 0xfe12, 0x3456)),
                    IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20)),
                    IpAddr::V4(Ipv4Addr::new(10, 0, 0, 5)),
                ],
            },
            InterfaceData {
                name: "wg0".to_string(),
                mac: "00:00:00:00:00:00".to_string(),
                addresses: Vec::new(),
            },
        ];

        let networks = build_networks(&interfaces, temp_dir.path());
        assert_eq!(networks.len(), 2);

        assert_eq!(networks[0].interface_index, "2");
        assert_eq!(networks[0].description, "eth0");
        assert_eq!(networks[0].ipv4_address, "192.168.1.20");
        assert_eq!(networks[0].ipv6_address, "fe80::5054:ff:fe12:3456");

        // no sysfs entry
        assert_eq!(networks[1].interface_index, "");
        assert_eq!(networks[1].ipv4_address, "");
        assert_eq!(networks[1].ipv6_address, "");
    }
}
