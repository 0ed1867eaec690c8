use perfdata_core::analyze;

fn main() {
    let perfdata = "'load avg'=1.50;2;3;0;10 rta=0.42ms;100:;@200;0 pl=U";

    match analyze(perfdata, "check_ping") {
        Ok(report) => {
            let json_output = report.to_json().unwrap();
            println!("Parsed perfdata to JSON:\n{json_output}");
            println!("Overall status: {}", report.worst_status());
        }
        Err(e) => {
            eprintln!("Failed to parse perfdata: {:?}", miette::Report::new(e));
        }
    }
}
