use crate::car::traction::resolve_roles;
use crate::car::{Car, CarPersistedState, NeighbourSnapshot};
use crate::coupler::{CouplerAngles, CouplerSolveCoeffs, CouplerState};
use crate::environment::{CarControls, SuperelevationTable, TrackSnapshot};
use crate::imports::*;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
/// Cars in train order, front first
pub struct Train {
    /// private so that neighbour links and traction roles stay in sync with
    /// the order of cars
    cars: Vec<Car>,
    #[serde(default)]
    pub superelevation_table: SuperelevationTable,
}

impl SerdeAPI for Train {
    fn init(&mut self) -> Result<(), Error> {
        self.cars.init()?;
        self.superelevation_table.validate()?;
        self.recompose();
        Ok(())
    }
}

impl Train {
    pub fn new(cars: Vec<Car>, superelevation_table: SuperelevationTable) -> Self {
        let mut train = Self {
            cars,
            superelevation_table,
        };
        train.recompose();
        train
    }

    pub fn cars(&self) -> &[Car] {
        &self.cars
    }

    pub fn car(&self, idx: usize) -> Option<&Car> {
        self.cars.get(idx)
    }

    pub fn car_mut(&mut self, idx: usize) -> Option<&mut Car> {
        self.cars.get_mut(idx)
    }

    pub fn len(&self) -> usize {
        self.cars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cars.is_empty()
    }

    /// Recomputes neighbour indices and traction roles from the car order
    fn recompose(&mut self) {
        let n_cars = self.cars.len();
        let kinds: Vec<_> = self.cars.iter().map(|car| car.params.traction).collect();
        for (idx, (car, role)) in self
            .cars
            .iter_mut()
            .zip(resolve_roles(&kinds))
            .enumerate()
        {
            car.car_ahead = idx.checked_sub(1);
            car.car_behind = (idx + 1 < n_cars).then_some(idx + 1);
            car.role = role;
        }
        if let Some(last) = self.cars.last_mut() {
            last.coupler = CouplerState::default();
            last.rear_angles = CouplerAngles::default();
        }
        if let Some(first) = self.cars.first_mut() {
            first.front_angles = CouplerAngles::default();
        }
    }

    /// Couples `other` to the rear of this train
    pub fn couple(&mut self, other: Train) {
        self.cars.extend(other.cars);
        self.recompose();
    }

    /// Splits the train ahead of car `idx` and returns the rear portion
    pub fn uncouple(&mut self, idx: usize) -> anyhow::Result<Train> {
        if idx == 0 || idx >= self.cars.len() {
            bail!(Error::CompositionError(format!(
                "cannot uncouple ahead of car {idx} in a train of {} cars",
                self.cars.len()
            )));
        }
        let rear = self.cars.split_off(idx);
        self.recompose();
        Ok(Train::new(rear, self.superelevation_table.clone()))
    }

    /// Reverses the direction of travel.  Car order, orientation and speed
    /// sign flip, and each coupler state moves to the car that owns it from
    /// the new front.
    pub fn reverse(&mut self) {
        self.cars.reverse();
        let couplers: Vec<CouplerState> = self.cars.iter().map(|car| car.coupler).collect();
        for (idx, car) in self.cars.iter_mut().enumerate() {
            car.flipped = !car.flipped;
            car.state.speed = -car.state.speed;
            car.coupler = couplers.get(idx + 1).copied().unwrap_or_default();
            std::mem::swap(&mut car.front_angles, &mut car.rear_angles);
        }
        self.recompose();
    }

    /// Advances every car by `dt`.  Each car sees its neighbours as they were
    /// before any car was stepped.
    pub fn step(
        &mut self,
        dt: si::Time,
        tracks: &[TrackSnapshot],
        controls: &[CarControls],
    ) -> anyhow::Result<()> {
        ensure!(
            tracks.len() == self.cars.len() && controls.len() == self.cars.len(),
            "{}\none track snapshot and one control set required per car",
            format_dbg!((self.cars.len(), tracks.len(), controls.len()))
        );
        for (idx, track) in tracks.iter().enumerate() {
            track
                .validate()
                .map_err(Error::from)
                .with_context(|| format_dbg!(idx))?;
        }
        let snapshots: Vec<NeighbourSnapshot> = self
            .cars
            .iter()
            .zip(tracks)
            .map(|(car, track)| car.neighbour_snapshot(track))
            .collect();
        for (idx, car) in self.cars.iter_mut().enumerate() {
            let ahead = car.car_ahead.and_then(|i| snapshots.get(i));
            let behind = car.car_behind.and_then(|i| snapshots.get(i));
            car.step(
                dt,
                &tracks[idx],
                &controls[idx],
                ahead,
                behind,
                &self.superelevation_table,
            )
            .with_context(|| format_dbg!(idx))?;
        }
        Ok(())
    }

    /// Solver rows for the coupler behind each car, front first
    pub fn coupler_solve_coeffs(&self) -> Vec<CouplerSolveCoeffs> {
        self.cars
            .iter()
            .map(|car| car.state.coupler_coeffs)
            .collect()
    }

    /// Hands back one resolved coupler force per car; the last car's entry
    /// has no coupler behind it and is ignored
    pub fn set_resolved_coupler_forces(&mut self, forces: &[si::Force]) -> anyhow::Result<()> {
        ensure!(
            forces.len() == self.cars.len(),
            "{}\none resolved coupler force required per car",
            format_dbg!((self.cars.len(), forces.len()))
        );
        for (car, force) in self.cars.iter_mut().zip(forces) {
            if car.car_behind.is_some() {
                car.apply_coupler_force(*force);
            }
        }
        Ok(())
    }

    /// Sets per-car speeds from the external integrator
    pub fn set_speed(&mut self, speeds: &[si::Velocity]) -> anyhow::Result<()> {
        ensure!(
            speeds.len() == self.cars.len(),
            "{}\none speed required per car",
            format_dbg!((self.cars.len(), speeds.len()))
        );
        for (car, speed) in self.cars.iter_mut().zip(speeds) {
            car.set_speed(*speed);
        }
        Ok(())
    }

    /// Set save interval and cascade to every car
    pub fn set_save_interval(&mut self, save_interval: Option<usize>) {
        self.cars
            .iter_mut()
            .for_each(|car| car.set_save_interval(save_interval));
    }

    pub fn persisted_state(&self) -> Vec<CarPersistedState> {
        self.cars.iter().map(|car| car.persisted_state()).collect()
    }

    pub fn restore_state(&mut self, persisted: &[CarPersistedState]) -> anyhow::Result<()> {
        ensure!(
            persisted.len() == self.cars.len(),
            "{}\npersisted state does not match train length",
            format_dbg!((self.cars.len(), persisted.len()))
        );
        for (car, state) in self.cars.iter_mut().zip(persisted) {
            car.restore_state(state);
        }
        Ok(())
    }
}
