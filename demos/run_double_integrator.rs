//! Drives a double integrator to a target position and prints the converged
//! trajectory. The closest in-scope analogue of the original project's
//! CSV/CLI driver.

mod double_integrator;

use nalgebra::DVector;

use double_integrator::DoubleIntegrator;
use ilqr_core::{BoxQpConfig, FiniteDifferenceConfig, IlqrConfig, IlqrDriver, TerminationReason};

fn main() {
    let model = DoubleIntegrator::new(0.1, 1.0);
    let horizon = 40;

    let x0 = DVector::from_vec(vec![0.0, 0.0]);
    let u0 = vec![DVector::from_vec(vec![0.0]); horizon];

    let mut driver = IlqrDriver::init_traj(
        model,
        IlqrConfig::default(),
        BoxQpConfig::default(),
        FiniteDifferenceConfig::default(),
        x0,
        u0,
    )
    .expect("double integrator dimensions are internally consistent");

    println!("initial cost: {:.6}", driver.cost());

    let result = driver.generate_trajectory();

    let reason = match result.termination {
        TerminationReason::ToleranceReached => "tolerance reached",
        TerminationReason::MaxIterations => "max iterations",
        TerminationReason::RegularizationExhausted => "regularization exhausted",
    };
    println!(
        "converged in {} iterations ({}), final cost {:.6}",
        result.iterations, reason, result.cost
    );

    for (t, x) in result.xs.iter().enumerate() {
        println!("t={t:3} position={:.4} velocity={:.4}", x[0], x[1]);
    }
}
