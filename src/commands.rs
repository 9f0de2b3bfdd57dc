use std::path::Path;

use anyhow::{Context, Result};
use geo::MultiPolygon;
use log::info;

use crate::cli::Cli;
use crate::io::{error_sink_path, read_layer, LayerSink};
use crate::pipeline::{Pipeline, Reassembled};

/// Load the input layer, decompose it, then simplify and write it once per
/// requested tolerance, finest first.  Later tolerances continue from the
/// already-simplified linework.
pub fn simplify(cli: &Cli) -> Result<()> {
    let mut outputs = cli.outputs()?;
    outputs.sort();

    info!("loading {}", cli.input.display());
    let layer = read_layer(&cli.input)?;
    let mut pipeline = Pipeline::decompose(layer)?;

    for (tolerance, outfile) in outputs {
        info!("simplifying linework to {tolerance}");
        pipeline.simplify(f64::from(tolerance));

        info!("building {}", outfile.display());
        write_output(&pipeline, f64::from(tolerance), &outfile)?;
    }
    Ok(())
}

fn write_output(pipeline: &Pipeline, tolerance: f64, outfile: &Path) -> Result<()> {
    let layer = pipeline.layer();
    let mut sink = LayerSink::create(outfile, &layer.fields, layer.srs.as_deref())
        .with_context(|| format!("failed to create output {}", outfile.display()))?;
    // The error layer is created lazily; most runs never need it.
    let mut errors: Option<LayerSink> = None;

    for (i, outcome) in pipeline.reassemble(tolerance).into_iter().enumerate() {
        let values = &layer.features[i].values;
        match outcome {
            Reassembled::Polygon(polygon) => {
                sink.append_polygon(values, &MultiPolygon::new(vec![polygon]))?;
            }
            Reassembled::Dropped { .. } => {}
            Reassembled::Corrupt { lines, .. } => {
                if errors.is_none() {
                    let path = error_sink_path(outfile);
                    errors = Some(
                        LayerSink::create(&path, &layer.fields, layer.srs.as_deref())
                            .with_context(|| {
                                format!("failed to create error layer {}", path.display())
                            })?,
                    );
                }
                if let Some(errors) = errors.as_mut() {
                    errors.append_lines(values, &lines)?;
                }
            }
        }
    }

    sink.finish()?;
    if let Some(errors) = errors {
        errors.finish()?;
    }
    Ok(())
}
