/*!

This is the long-form manual for `election_results` and the `electiondash` dashboard.

## Input formats

Results are tables with one row per party and per federal state. Two providers are supported:
* `csv` Comma Separated Values, the first row being the header
* `xlsx` Excel workbooks, the first row of the worksheet being the header

Both providers accept the same two layouts. The layout is detected from the names in
the header (case does not matter, surrounding spaces are ignored).

### Long layout

One row per state, party and vote type:

```text
state,party,vote_type,votes
Bayern,Christlich-Soziale Union in Bayern e.V.,first,2963189
Bayern,Christlich-Soziale Union in Bayern e.V.,second,2964028
```

The `vote_type` column accepts `first` and `second` (also `1`/`2`, `erststimme`/`zweitstimme`).

### Wide layout

One row per state and party, with both vote types:

```text
state,party,first_votes,second_votes,first_share,second_share,date
Berlin,Die Linke,412000,409000,19.9,19.9,2025-02-23
Berlin,Volt Deutschland,,29000,,1.4,2025-02-23
```

Any other column (for example precomputed shares or the election date) is ignored: shares
are always recomputed from the counts.

### Rules for the counts

- an empty count is read as zero (small parties usually have no direct candidates, and so
  no first votes);
- counts must be whole non-negative numbers. Counts written as floats (`1234.0`, `2.5e6`)
  are accepted when they hold an exact integer, at most 2^53;
- the total of each vote type over all the files must fit in an unsigned 64-bit integer;
- a party may appear only once per state and vote type.

Any violation stops the loading with an error that names the file and the line.

## Configuration

The dashboard accepts a configuration file in JSON:

```json
{
  "title": "Germany 2025 Election Dashboard",
  "dataSources": [
    {"provider": "csv", "filePath": "elections_2025_state_party.csv"},
    {"provider": "xlsx", "filePath": "late_results.xlsx", "excelWorksheetName": "Results"}
  ],
  "partyColors": {"Volt Deutschland": "#612095"},
  "defaultTopN": 6
}
```

- `dataSources` (mandatory): the files to read. Relative paths are resolved from the directory
  of the configuration file. All the files are merged into a single dataset.
- `excelWorksheetName` (string, optional): for Excel inputs, the worksheet to read. The first
  worksheet is used otherwise.
- `title` (string, optional): the title of the page.
- `partyColors` (map, optional): colors for parties, added to (or replacing) the built-in colors.
- `defaultTopN` (number between 2 and 6, optional): the number of parties shown in the state view.

Without a configuration file, a single file can be passed with `--input` (and `--input-type`).

 */
