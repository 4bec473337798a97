//! # Network Layer
//!
//! An isolated VPC across two availability zones with three subnet tiers:
//!
//! - **Public** - routes `0.0.0.0/0` to the internet gateway; hosts the NAT gateway
//! - **Private** - routes `0.0.0.0/0` to the NAT gateway (egress only)
//! - **Database** - isolated; its route tables carry no routes at all
//!
//! Every subnet is a `/24` allocated sequentially from the VPC block, so the
//! tiers never overlap.

use serde_json::{json, Value};
use std::net::Ipv4Addr;
use std::str::FromStr;
use tracing::info;

use crate::constants::{AVAILABILITY_ZONES, NAT_GATEWAYS, SUBNET_CIDR_MASK, VPC_CIDR};
use crate::error::StackError;
use crate::stack::StackBuilder;
use crate::template::intrinsic::{get_azs, select};
use crate::template::{Resource, ResourceHandle};

const VPC_ID: &str = "TapVpc";

/// Subnet classification by reachability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubnetTier {
    Public,
    PrivateWithEgress,
    PrivateIsolated,
}

impl SubnetTier {
    /// Allocation order
    pub const ALL: [SubnetTier; 3] = [
        SubnetTier::Public,
        SubnetTier::PrivateWithEgress,
        SubnetTier::PrivateIsolated,
    ];

    /// Name used in logical ids and tags
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            SubnetTier::Public => "Public",
            SubnetTier::PrivateWithEgress => "Private",
            SubnetTier::PrivateIsolated => "Database",
        }
    }
}

/// A declared subnet and its route table
#[derive(Debug, Clone)]
pub struct Subnet {
    pub tier: SubnetTier,
    pub az_index: usize,
    pub cidr: String,
    pub subnet: ResourceHandle,
    pub route_table: ResourceHandle,
}

#[derive(Debug, Clone)]
pub struct Network {
    pub vpc: ResourceHandle,
    pub internet_gateway: ResourceHandle,
    pub nat_gateways: Vec<ResourceHandle>,
    /// Default routes of the private tier; resources placed there wait on them
    pub egress_routes: Vec<ResourceHandle>,
    pub subnets: Vec<Subnet>,
}

impl Network {
    pub fn subnets(&self, tier: SubnetTier) -> impl Iterator<Item = &Subnet> {
        self.subnets.iter().filter(move |s| s.tier == tier)
    }

    /// `Ref`s of every subnet in a tier, in AZ order
    #[must_use]
    pub fn subnet_refs(&self, tier: SubnetTier) -> Vec<Value> {
        self.subnets(tier).map(|s| s.subnet.reference()).collect()
    }
}

/// Sequential allocator of equally sized blocks inside a parent CIDR
#[derive(Debug)]
pub struct CidrAllocator {
    cidr: String,
    base: u32,
    parent_mask: u8,
    mask: u8,
    next: usize,
}

impl CidrAllocator {
    /// # Errors
    ///
    /// Fails if `cidr` is malformed, misaligned, or larger than `mask`.
    pub fn new(cidr: &str, mask: u8) -> Result<Self, StackError> {
        let invalid = || StackError::InvalidConfig(format!("invalid CIDR block '{cidr}'"));
        let (addr, prefix) = cidr.split_once('/').ok_or_else(invalid)?;
        let addr = Ipv4Addr::from_str(addr).map_err(|_| invalid())?;
        let parent_mask: u8 = prefix.parse().map_err(|_| invalid())?;
        if parent_mask > 32 || mask > 32 || mask < parent_mask {
            return Err(invalid());
        }
        let base = u32::from(addr);
        if parent_mask < 32 && base & (u32::MAX >> parent_mask) != 0 {
            return Err(invalid());
        }
        Ok(Self {
            cidr: cidr.to_string(),
            base,
            parent_mask,
            mask,
            next: 0,
        })
    }

    /// Next free block, e.g. `10.0.3.0/24`
    ///
    /// # Errors
    ///
    /// [`StackError::CidrExhausted`] once the parent block is used up.
    pub fn allocate(&mut self) -> Result<String, StackError> {
        let exhausted = || StackError::CidrExhausted {
            cidr: self.cidr.clone(),
            mask: self.mask,
            index: self.next,
        };
        let capacity = 1u64 << (self.mask - self.parent_mask);
        if self.next as u64 >= capacity {
            return Err(exhausted());
        }
        let block_size = 1u64 << (32 - u32::from(self.mask));
        let offset = u32::try_from(self.next as u64 * block_size).map_err(|_| exhausted())?;
        let start = Ipv4Addr::from(self.base + offset);
        self.next += 1;
        Ok(format!("{start}/{}", self.mask))
    }
}

/// Declare the VPC, its subnets, gateways and routing
pub fn declare(builder: &mut StackBuilder, prefix: &str) -> Result<Network, StackError> {
    info!(
        cidr = VPC_CIDR,
        azs = AVAILABILITY_ZONES,
        nat_gateways = NAT_GATEWAYS,
        "declaring network layer"
    );

    let vpc = builder.declare(Resource::new(VPC_ID, "AWS::EC2::VPC").properties(json!({
        "CidrBlock": VPC_CIDR,
        "EnableDnsHostnames": true,
        "EnableDnsSupport": true,
        "InstanceTenancy": "default",
        "Tags": [name_tag(&format!("{prefix}/{VPC_ID}"))]
    })))?;

    let internet_gateway = builder.declare(
        Resource::new(format!("{VPC_ID}IGW"), "AWS::EC2::InternetGateway").properties(json!({
            "Tags": [name_tag(&format!("{prefix}/{VPC_ID}"))]
        })),
    )?;

    let gateway_attachment = builder.declare(
        Resource::new(format!("{VPC_ID}VPCGW"), "AWS::EC2::VPCGatewayAttachment").properties(
            json!({
                "VpcId": vpc.reference(),
                "InternetGatewayId": internet_gateway.reference()
            }),
        ),
    )?;

    let mut allocator = CidrAllocator::new(VPC_CIDR, SUBNET_CIDR_MASK)?;
    let mut subnets = Vec::with_capacity(SubnetTier::ALL.len() * AVAILABILITY_ZONES);
    let mut nat_gateways = Vec::with_capacity(NAT_GATEWAYS);
    let mut egress_routes = Vec::with_capacity(AVAILABILITY_ZONES);

    for tier in SubnetTier::ALL {
        for az_index in 0..AVAILABILITY_ZONES {
            let subnet = declare_subnet(builder, &vpc, prefix, tier, az_index, &mut allocator)?;
            let id = subnet_id(tier, az_index);

            match tier {
                SubnetTier::Public => {
                    let default_route = builder.declare(
                        Resource::new(format!("{id}DefaultRoute"), "AWS::EC2::Route")
                            .properties(json!({
                                "RouteTableId": subnet.route_table.reference(),
                                "DestinationCidrBlock": "0.0.0.0/0",
                                "GatewayId": internet_gateway.reference()
                            }))
                            .depends_on(&gateway_attachment),
                    )?;
                    if az_index < NAT_GATEWAYS {
                        nat_gateways.push(declare_nat_gateway(
                            builder,
                            prefix,
                            &subnet,
                            &default_route,
                        )?);
                    }
                }
                SubnetTier::PrivateWithEgress => {
                    let nat = nat_gateways.get(az_index % NAT_GATEWAYS.max(1)).ok_or_else(|| {
                        StackError::InvalidConfig(
                            "private subnets need at least one NAT gateway".to_string(),
                        )
                    })?;
                    egress_routes.push(builder.declare(
                        Resource::new(format!("{id}DefaultRoute"), "AWS::EC2::Route").properties(
                            json!({
                                "RouteTableId": subnet.route_table.reference(),
                                "DestinationCidrBlock": "0.0.0.0/0",
                                "NatGatewayId": nat.reference()
                            }),
                        ),
                    )?);
                }
                // No route: the isolated tier must never reach the internet
                SubnetTier::PrivateIsolated => {}
            }

            subnets.push(subnet);
        }
    }

    Ok(Network {
        vpc,
        internet_gateway,
        nat_gateways,
        egress_routes,
        subnets,
    })
}

fn subnet_id(tier: SubnetTier, az_index: usize) -> String {
    format!("{VPC_ID}{}Subnet{}", tier.name(), az_index + 1)
}

fn declare_subnet(
    builder: &mut StackBuilder,
    vpc: &ResourceHandle,
    prefix: &str,
    tier: SubnetTier,
    az_index: usize,
    allocator: &mut CidrAllocator,
) -> Result<Subnet, StackError> {
    let id = subnet_id(tier, az_index);
    let cidr = allocator.allocate()?;

    let subnet = builder.declare(Resource::new(id.clone(), "AWS::EC2::Subnet").properties(json!({
        "VpcId": vpc.reference(),
        "CidrBlock": cidr,
        "AvailabilityZone": select(az_index, get_azs()),
        "MapPublicIpOnLaunch": tier == SubnetTier::Public,
        "Tags": [
            name_tag(&format!("{prefix}/{VPC_ID}/{}Subnet{}", tier.name(), az_index + 1)),
            { "Key": "tap:subnet-tier", "Value": tier.name() }
        ]
    })))?;

    let route_table = builder.declare(
        Resource::new(format!("{id}RouteTable"), "AWS::EC2::RouteTable").properties(json!({
            "VpcId": vpc.reference(),
            "Tags": [name_tag(&format!("{prefix}/{VPC_ID}/{}Subnet{}", tier.name(), az_index + 1))]
        })),
    )?;

    builder.declare(
        Resource::new(
            format!("{id}RouteTableAssociation"),
            "AWS::EC2::SubnetRouteTableAssociation",
        )
        .properties(json!({
            "RouteTableId": route_table.reference(),
            "SubnetId": subnet.reference()
        })),
    )?;

    Ok(Subnet {
        tier,
        az_index,
        cidr,
        subnet,
        route_table,
    })
}

/// The gateway must not be created before its subnet can reach the internet
fn declare_nat_gateway(
    builder: &mut StackBuilder,
    prefix: &str,
    public_subnet: &Subnet,
    default_route: &ResourceHandle,
) -> Result<ResourceHandle, StackError> {
    let id = subnet_id(public_subnet.tier, public_subnet.az_index);
    let tag = name_tag(&format!(
        "{prefix}/{VPC_ID}/PublicSubnet{}",
        public_subnet.az_index + 1
    ));

    let eip = builder.declare(
        Resource::new(format!("{id}EIP"), "AWS::EC2::EIP")
            .properties(json!({ "Domain": "vpc", "Tags": [tag.clone()] }))
            .depends_on(default_route),
    )?;

    builder.declare(
        Resource::new(format!("{id}NATGateway"), "AWS::EC2::NatGateway")
            .properties(json!({
                "SubnetId": public_subnet.subnet.reference(),
                "AllocationId": eip.attr("AllocationId"),
                "Tags": [tag]
            }))
            .depends_on(default_route),
    )
}

fn name_tag(value: &str) -> Value {
    json!({ "Key": "Name", "Value": value })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::Template;

    fn network() -> (Network, Template) {
        let mut builder = StackBuilder::default();
        let network = declare(&mut builder, "tap").unwrap();
        (network, builder.finish())
    }

    #[test]
    fn test_cidr_allocator_sequence() {
        let mut allocator = CidrAllocator::new("10.0.0.0/16", 24).unwrap();
        assert_eq!(allocator.allocate().unwrap(), "10.0.0.0/24");
        assert_eq!(allocator.allocate().unwrap(), "10.0.1.0/24");
        assert_eq!(allocator.allocate().unwrap(), "10.0.2.0/24");
    }

    #[test]
    fn test_cidr_allocator_exhaustion() {
        let mut allocator = CidrAllocator::new("10.0.0.0/23", 24).unwrap();
        allocator.allocate().unwrap();
        allocator.allocate().unwrap();
        assert!(matches!(
            allocator.allocate(),
            Err(StackError::CidrExhausted { index: 2, .. })
        ));
    }

    #[test]
    fn test_cidr_allocator_rejects_bad_blocks() {
        assert!(CidrAllocator::new("10.0.0.0", 24).is_err());
        assert!(CidrAllocator::new("10.0.0.1/16", 24).is_err());
        assert!(CidrAllocator::new("10.0.0.0/24", 16).is_err());
        assert!(CidrAllocator::new("not-an-ip/16", 24).is_err());
    }

    #[test]
    fn test_two_azs_three_tiers() {
        let (network, _) = network();
        for tier in SubnetTier::ALL {
            assert_eq!(network.subnets(tier).count(), AVAILABILITY_ZONES);
        }
        assert_eq!(network.nat_gateways.len(), 1);
    }

    #[test]
    fn test_subnet_cidrs_are_disjoint_24s() {
        let (network, _) = network();
        let cidrs: Vec<_> = network.subnets.iter().map(|s| s.cidr.as_str()).collect();
        assert_eq!(
            cidrs,
            vec![
                "10.0.0.0/24",
                "10.0.1.0/24",
                "10.0.2.0/24",
                "10.0.3.0/24",
                "10.0.4.0/24",
                "10.0.5.0/24"
            ]
        );
    }

    #[test]
    fn test_isolated_route_tables_have_no_routes() {
        let (network, template) = network();
        let isolated: Vec<_> = network
            .subnets(SubnetTier::PrivateIsolated)
            .map(|s| s.route_table.reference())
            .collect();
        for route in template.resources_of_type("AWS::EC2::Route") {
            let table = route.property("/RouteTableId").unwrap();
            assert!(!isolated.contains(table), "{} routes an isolated table", route.logical_id);
        }
    }

    #[test]
    fn test_private_routes_use_nat_and_public_routes_use_igw() {
        let (network, template) = network();
        for subnet in network.subnets(SubnetTier::PrivateWithEgress) {
            let route = template
                .resources_of_type("AWS::EC2::Route")
                .find(|r| r.property("/RouteTableId") == Some(&subnet.route_table.reference()))
                .unwrap();
            assert_eq!(
                route.property("/NatGatewayId"),
                Some(&network.nat_gateways[0].reference())
            );
            assert!(route.property("/GatewayId").is_none());
        }
        for subnet in network.subnets(SubnetTier::Public) {
            let route = template
                .resources_of_type("AWS::EC2::Route")
                .find(|r| r.property("/RouteTableId") == Some(&subnet.route_table.reference()))
                .unwrap();
            assert_eq!(
                route.property("/GatewayId"),
                Some(&network.internet_gateway.reference())
            );
        }
    }

    #[test]
    fn test_nat_gateway_waits_for_internet_route() {
        let (network, template) = network();
        let route_id = "TapVpcPublicSubnet1DefaultRoute";
        let route = template.resource(route_id).unwrap();
        assert_eq!(route.depends_on, vec!["TapVpcVPCGW".to_string()]);

        let nat = template.resource(network.nat_gateways[0].logical_id()).unwrap();
        assert!(nat.depends_on.iter().any(|id| id == route_id));
        let eip = template.resource("TapVpcPublicSubnet1EIP").unwrap();
        assert!(eip.depends_on.iter().any(|id| id == route_id));
    }

    #[test]
    fn test_egress_routes_are_the_private_default_routes() {
        let (network, template) = network();
        assert_eq!(network.egress_routes.len(), AVAILABILITY_ZONES);
        for route in &network.egress_routes {
            let declared = template.resource(route.logical_id()).unwrap();
            assert!(declared.property("/NatGatewayId").is_some());
        }
    }

    #[test]
    fn test_nat_gateway_sits_in_first_public_subnet() {
        let (network, template) = network();
        let nat = template.resource(network.nat_gateways[0].logical_id()).unwrap();
        let first_public = network.subnets(SubnetTier::Public).next().unwrap();
        assert_eq!(nat.property("/SubnetId"), Some(&first_public.subnet.reference()));
    }
}
