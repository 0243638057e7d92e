use super::{ImmersedBoundary, Mapper};
use crate::body::Body;
use crate::error::FlowResult;
use crate::mapping::SearchReport;
use crate::{Domain, Field2, Scalars};

/// Direct no-slip enforcement: faces inside a body take its velocity.
#[derive(Clone, Debug, Default)]
pub struct RigidForcing {
    per_body: Vec<Field2>,
}

impl RigidForcing {
    /// Index of the body whose own level set is lowest at the face between
    /// cells `a` and `b`.
    fn owner(&self, a: (usize, usize), b: (usize, usize)) -> usize {
        let mut best = 0;
        let mut best_phi = f64::INFINITY;
        for (k, field) in self.per_body.iter().enumerate() {
            let face = 0.5 * (field.get(a.0, a.1) + field.get(b.0, b.1));
            if face < best_phi {
                best_phi = face;
                best = k;
            }
        }
        best
    }
}

impl ImmersedBoundary for RigidForcing {
    fn map_to_grid(
        &mut self,
        mapper: &Mapper,
        bodies: &[Body],
        domain: &mut Domain,
    ) -> FlowResult<SearchReport> {
        let (per_body, report) = mapper.map_bodies(bodies, &mut domain.phi)?;
        self.per_body = per_body;
        Ok(report)
    }

    fn force_flow(
        &mut self,
        bodies: &[Body],
        domain: &mut Domain,
        _scalars: &Scalars,
    ) -> FlowResult<()> {
        if bodies.is_empty() {
            return Ok(());
        }
        let phi = &domain.phi;
        phi.require_guards("rigid forcing")?;
        let single = bodies.len() == 1 || self.per_body.len() != bodies.len();
        let (u, v) = domain.velocity.components_mut();

        let ugrid = u.grid();
        for j in 0..ugrid.height() {
            for i in 0..ugrid.width() {
                let face = 0.5 * (phi.get(i, j) + phi.get(i + 1, j));
                if face <= 0.0 {
                    let k = if single { 0 } else { self.owner((i, j), (i + 1, j)) };
                    u.set(i, j, bodies[k].velocity().x);
                }
            }
        }

        let vgrid = v.grid();
        for j in 0..vgrid.height() {
            for i in 0..vgrid.width() {
                let face = 0.5 * (phi.get(i, j) + phi.get(i, j + 1));
                if face <= 0.0 {
                    let k = if single { 0 } else { self.owner((i, j), (i, j + 1)) };
                    v.set(i, j, bodies[k].velocity().y);
                }
            }
        }
        Ok(())
    }

    fn advect(&mut self, _domain: &mut Domain, _scalars: &Scalars) -> FlowResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::body::{Body, Kinematics};
    use crate::boundary::{BoundaryConfig, BoundarySide};
    use crate::config::{IbType, MappingType, SimulationConfig};
    use crate::error::FlowError;
    use crate::grid::Bounds;
    use crate::imbound::ImBound;
    use crate::{Domain, Scalars, Vec2};

    fn rigid_config(mapping_type: MappingType) -> SimulationConfig {
        SimulationConfig {
            with_ib: true,
            ib_type: IbType::Rigid,
            mapping_type,
            ..SimulationConfig::default()
        }
    }

    fn cylinder_domain() -> Domain {
        let mut domain = Domain::new(60, 40, Bounds::new(-1.5, 4.5, -2.0, 2.0)).unwrap();
        domain
            .phi
            .set_bc(BoundaryConfig::uniform(BoundarySide::projection()));
        domain.velocity.u_mut().fill(1.0);
        domain.velocity.v_mut().fill(0.25);
        domain.fill_all_guard_cells().unwrap();
        domain
    }

    #[test]
    fn stationary_cylinder_enforces_no_slip_exactly() {
        for mapping in [
            MappingType::Classical,
            MappingType::Accelerated,
            MappingType::Polygon,
        ] {
            let body = Body::circle(Vec2::zero(), 0.5, 80, Kinematics::Fixed).unwrap();
            let mut domain = cylinder_domain();
            let mut imbound = ImBound::new(&rigid_config(mapping), vec![body]);
            imbound.map_to_grid(&mut domain).unwrap();
            imbound
                .force_flow(&mut domain, &Scalars::default())
                .unwrap();

            let phi = &domain.phi;
            let u = domain.velocity.u();
            let mut inside = 0;
            for j in 0..u.grid().height() {
                for i in 0..u.grid().width() {
                    let face = 0.5 * (phi.get(i, j) + phi.get(i + 1, j));
                    if face <= 0.0 {
                        assert_eq!(u.get(i, j), 0.0);
                        inside += 1;
                    } else {
                        assert_eq!(u.get(i, j), 1.0);
                    }
                }
            }
            assert!(inside > 0);
            let v = domain.velocity.v();
            for j in 0..v.grid().height() {
                for i in 0..v.grid().width() {
                    let face = 0.5 * (phi.get(i, j) + phi.get(i, j + 1));
                    let expected = if face <= 0.0 { 0.0 } else { 0.25 };
                    assert_eq!(v.get(i, j), expected);
                }
            }
        }
    }

    #[test]
    fn each_body_imposes_its_own_velocity() {
        let left = Body::circle(
            Vec2::new(-0.5, 0.0),
            0.4,
            48,
            Kinematics::Translating {
                velocity: Vec2::new(0.3, -0.1),
            },
        )
        .unwrap();
        let right = Body::circle(
            Vec2::new(2.5, 0.5),
            0.4,
            48,
            Kinematics::Translating {
                velocity: Vec2::new(-0.2, 0.6),
            },
        )
        .unwrap();
        let mut domain = cylinder_domain();
        let mut imbound = ImBound::new(&rigid_config(MappingType::Polygon), vec![left, right]);
        imbound.map_to_grid(&mut domain).unwrap();
        imbound
            .force_flow(&mut domain, &Scalars::default())
            .unwrap();
        let grid = domain.xface_grid();
        let near = |cx: f64, cy: f64| {
            (0..grid.width())
                .flat_map(|i| (0..grid.height()).map(move |j| (i, j)))
                .min_by(|a, b| {
                    let pa = grid.coords(a.0, a.1);
                    let pb = grid.coords(b.0, b.1);
                    (pa.0 - cx)
                        .hypot(pa.1 - cy)
                        .total_cmp(&(pb.0 - cx).hypot(pb.1 - cy))
                })
                .unwrap()
        };
        let (i, j) = near(-0.5, 0.0);
        assert_eq!(domain.velocity.u().get(i, j), 0.3);
        let (i, j) = near(2.5, 0.5);
        assert_eq!(domain.velocity.u().get(i, j), -0.2);
    }

    #[test]
    fn stale_phi_guards_are_rejected() {
        let body = Body::circle(Vec2::zero(), 0.5, 40, Kinematics::Fixed).unwrap();
        let mut domain = cylinder_domain();
        let mut imbound = ImBound::new(&rigid_config(MappingType::Classical), vec![body]);
        imbound.map_to_grid(&mut domain).unwrap();
        domain.phi.set(1, 1, -1.0);
        let before = domain.velocity.clone();
        let err = imbound
            .force_flow(&mut domain, &Scalars::default())
            .unwrap_err();
        assert!(matches!(
            err,
            FlowError::StaleGuards {
                operation: "rigid forcing",
                ..
            }
        ));
        assert_eq!(domain.velocity, before);
    }
}
